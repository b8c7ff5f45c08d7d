use std::ops::{Add, Mul};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// A 1×n matrix holding `values`.
    pub fn row(values: &[f64]) -> Matrix {
        Matrix {
            rows: 1,
            cols: values.len(),
            data: vec![values.to_vec()],
        }
    }

    /// Builds a `rows × cols` matrix from row-major values.
    /// Returns `None` when `values.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, values: &[f32]) -> Option<Matrix> {
        if values.len() != rows * cols {
            return None;
        }
        let data = if cols == 0 {
            vec![Vec::new(); rows]
        } else {
            values
                .chunks(cols)
                .map(|row| row.iter().map(|&v| v as f64).collect())
                .collect()
        };
        Some(Matrix { rows, cols, data })
    }

    /// Row-major copy of the values, narrowed to f32 for shard storage.
    pub fn to_row_major(&self) -> Vec<f32> {
        self.data.iter().flat_map(|row| row.iter().map(|&v| v as f32)).collect()
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |r| r.len()),
            data
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }

        res
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res =  Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order walks rhs row by row, which matters for tall kernels.
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                let rhs_row = &rhs.data[k];
                let out_row = &mut res.data[i];
                for j in 0..rhs.cols {
                    out_row[j] += a * rhs_row[j];
                }
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_times_matrix() {
        let x = Matrix::row(&[1.0, 2.0]);
        let w = Matrix::from_data(vec![vec![1.0, 0.0, 2.0], vec![0.5, 1.0, -1.0]]);
        let y = &x * &w;
        assert_eq!(y.data, vec![vec![2.0, 2.0, 0.0]]);
    }

    #[test]
    fn row_major_round_trip_keeps_layout() {
        let m = Matrix::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.data[1], vec![4.0, 5.0, 6.0]);
        assert_eq!(m.to_row_major(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(Matrix::from_row_major(2, 2, &[1.0]).is_none());
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn add_rejects_mismatched_shapes() {
        let _ = &Matrix::zeros(1, 2) + &Matrix::zeros(1, 3);
    }
}
