//! 岭回归所需的最小线性代数。矩阵一律按行主序存放在 `Vec<f64>` 中。

use blackgem_core::forecast::error::ModelError;

/// # Summary
/// 求解 `(XᵀX + diag(penalty)) β = Xᵀy`。
///
/// # Arguments
/// * `x`: n×p 设计矩阵 (行主序)。
/// * `y`: 长度 n 的观测值。
/// * `p`: 列数。
/// * `penalty`: 每列的 L2 惩罚系数，长度 p。
///
/// # Returns
/// 成功返回长度 p 的系数向量。
pub(crate) fn ridge_solve(
    x: &[f64],
    y: &[f64],
    p: usize,
    penalty: &[f64],
) -> Result<Vec<f64>, ModelError> {
    let n = y.len();
    if x.len() != n * p || penalty.len() != p {
        return Err(ModelError::Numerical(format!(
            "dimension mismatch: x={} n={} p={} penalty={}",
            x.len(),
            n,
            p,
            penalty.len()
        )));
    }

    let mut gram = vec![0.0; p * p];
    let mut rhs = vec![0.0; p];
    for (row, &yi) in x.chunks_exact(p).zip(y) {
        for i in 0..p {
            let ri = row[i];
            if ri == 0.0 {
                continue;
            }
            rhs[i] += ri * yi;
            // 只累加下三角，最后对称复制
            for j in 0..=i {
                gram[i * p + j] += ri * row[j];
            }
        }
    }
    for i in 0..p {
        gram[i * p + i] += penalty[i];
        for j in 0..i {
            gram[j * p + i] = gram[i * p + j];
        }
    }

    cholesky_solve(&gram, &rhs, p)
}

/// # Summary
/// 对称正定矩阵的 Cholesky 分解求解 `A x = b`。
///
/// # Logic
/// 1. 分解 `A = L Lᵀ`，主元非正即判定为非正定。
/// 2. 前代求 `L z = b`。
/// 3. 回代求 `Lᵀ x = z`。
pub(crate) fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>, ModelError> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(ModelError::Numerical(format!(
                        "matrix is not positive definite at pivot {}",
                        i
                    )));
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= l[i * n + k] * z[k];
        }
        z[i] = s / l[i * n + i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut s = z[i];
        for k in i + 1..n {
            s -= l[k * n + i] * x[k];
        }
        x[i] = s / l[i * n + i];
    }
    Ok(x)
}
