use ndarray::Array1;

/// Adam state for one parameter vector.
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    /// First moment estimates
    m: Array1<f64>,
    /// Second moment estimates
    v: Array1<f64>,
    t: i32,
}

impl Adam {
    pub fn new(len: usize, lr: f64) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: Array1::zeros(len),
            v: Array1::zeros(len),
            t: 0,
        }
    }

    /// One descent step on `params` along `grad`.
    pub fn step(&mut self, params: &mut Array1<f64>, grad: &Array1<f64>) {
        self.t += 1;
        self.m = &self.m * self.beta1 + grad * (1.0 - self.beta1);
        self.v = &self.v * self.beta2 + &grad.mapv(|g| g * g) * (1.0 - self.beta2);

        let m_hat_scale = 1.0 / (1.0 - self.beta1.powi(self.t));
        let v_hat_scale = 1.0 / (1.0 - self.beta2.powi(self.t));
        for ((p, m), v) in params.iter_mut().zip(self.m.iter()).zip(self.v.iter()) {
            let m_hat = m * m_hat_scale;
            let v_hat = v * v_hat_scale;
            *p -= self.lr * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }

    pub fn steps_taken(&self) -> i32 {
        self.t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(2, 0.01);
        let mut p = array![1.0, -1.0];
        adam.step(&mut p, &array![3.0, -0.5]);
        assert_abs_diff_eq!(p[0], 0.99, epsilon = 1e-6);
        assert_abs_diff_eq!(p[1], -0.99, epsilon = 1e-6);
        assert_eq!(adam.steps_taken(), 1);
    }

    #[test]
    fn minimizes_a_quadratic() {
        let mut adam = Adam::new(1, 0.1);
        let mut p = array![5.0];
        for _ in 0..500 {
            let grad = p.mapv(|v| 2.0 * (v - 2.0));
            adam.step(&mut p, &grad);
        }
        assert_abs_diff_eq!(p[0], 2.0, epsilon = 0.05);
    }
}
