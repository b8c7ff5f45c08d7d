/// Averages an HWC tensor over its spatial axes, leaving one value per channel.
pub fn global_average_pool(input: &[f64], height: usize, width: usize, channels: usize) -> Vec<f64> {
    let mut sums = vec![0.0; channels];
    let pixels = height * width;
    if pixels == 0 || channels == 0 {
        return sums;
    }
    for pixel in input.chunks_exact(channels).take(pixels) {
        for (sum, &v) in sums.iter_mut().zip(pixel) {
            *sum += v;
        }
    }
    sums.iter_mut().for_each(|s| *s /= pixels as f64);
    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_each_channel_independently() {
        // 1×2 image, 3 channels.
        let input = [0.0, 1.0, 0.5, 1.0, 1.0, 0.0];
        assert_eq!(global_average_pool(&input, 1, 2, 3), vec![0.5, 1.0, 0.25]);
    }
}
