use {
    super::{
        Environment,
        Sampleable,
        Step,
        TensorConvertible,
        VectorConvertible,
    },
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    rand::{
        rngs::StdRng,
        Rng,
        RngCore,
        SeedableRng,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        f64::consts::PI,
        ops::RangeInclusive,
    },
    tracing::info,
};

/// Wrap an angle into `[-PI, PI)`.
fn angle_normalize(theta: f64) -> f64 {
    ((theta + PI).rem_euclid(2.0 * PI)) - PI
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PendulumConfig {
    pub gravity: f64,
    pub mass: f64,
    pub length: f64,
    pub dt: f64,
    pub max_speed: f64,
    pub max_torque: f64,
    pub timelimit: usize,
}
impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            gravity: 10.0,
            mass: 1.0,
            length: 1.0,
            dt: 0.05,
            max_speed: 8.0,
            max_torque: 2.0,
            timelimit: 200,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PendulumAction {
    // Torque applied to the free end of the pendulum
    tau: f64,
}
impl VectorConvertible for PendulumAction {
    fn from_vec(value: Vec<f64>) -> Self {
        Self { tau: value[0] }
    }
    fn to_vec(value: Self) -> Vec<f64> {
        vec![value.tau]
    }
}
impl TensorConvertible for PendulumAction {
    fn from_tensor(value: Tensor) -> Self {
        Self::from_vec(value.to_vec1::<f64>().unwrap())
    }
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        Tensor::new(Self::to_vec(value), device)
    }
}
impl Sampleable for PendulumAction {
    fn sample(
        rng: &mut dyn RngCore,
        domain: &[RangeInclusive<f64>],
    ) -> Self {
        Self {
            tau: rng.gen_range(domain[0].clone()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PendulumObs {
    // The (x, y) coordinates of the free end of the pendulum
    x: f64,
    y: f64,
    // The angular velocity of the pendulum
    velocity: f64,
}
impl VectorConvertible for PendulumObs {
    fn from_vec(value: Vec<f64>) -> Self {
        Self {
            x: value[0],
            y: value[1],
            velocity: value[2],
        }
    }
    fn to_vec(value: Self) -> Vec<f64> {
        vec![value.x, value.y, value.velocity]
    }
}
impl TensorConvertible for PendulumObs {
    fn from_tensor(value: Tensor) -> Self {
        Self::from_vec(value.to_vec1::<f64>().unwrap())
    }
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        Tensor::new(Self::to_vec(value), device)
    }
}

/// The classic frictionless inverted pendulum swing-up task.
///
/// The pendulum starts at a random angle and the goal is to swing it up and
/// balance it over its pivot point by applying a bounded torque. Episodes
/// never terminate; they are truncated at the time limit.
pub struct PendulumEnv {
    config: PendulumConfig,
    rng: StdRng,
    theta: f64,
    theta_dot: f64,
    steps_taken: usize,
}

impl Environment for PendulumEnv {
    type Config = PendulumConfig;
    type Action = PendulumAction;
    type Observation = PendulumObs;

    fn config(&self) -> &PendulumConfig {
        &self.config
    }

    fn new(config: PendulumConfig) -> Result<Box<Self>> {
        Ok(Box::new(Self {
            config,
            rng: StdRng::seed_from_u64(0),
            theta: PI,
            theta_dot: 0.0,
            steps_taken: 0,
        }))
    }

    fn reset(
        &mut self,
        seed: u64,
    ) -> Result<PendulumObs> {
        self.rng = StdRng::seed_from_u64(seed);
        self.theta = self.rng.gen_range(-PI..=PI);
        self.theta_dot = self.rng.gen_range(-1.0..=1.0);
        self.steps_taken = 0;
        Ok(self.current_observation())
    }

    fn step(
        &mut self,
        action: PendulumAction,
    ) -> Result<Step<PendulumObs, PendulumAction>> {
        let PendulumConfig {
            gravity: g,
            mass: m,
            length: l,
            dt,
            max_speed,
            max_torque,
            ..
        } = self.config;

        // torque outside the actuator's limit is physically impossible
        let u = action.tau.clamp(-max_torque, max_torque);

        let cost = angle_normalize(self.theta).powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * u.powi(2);

        self.theta_dot = (self.theta_dot
            + (3.0 * g / (2.0 * l) * self.theta.sin() + 3.0 / (m * l.powi(2)) * u) * dt)
            .clamp(-max_speed, max_speed);
        self.theta += self.theta_dot * dt;
        self.steps_taken += 1;

        info!(
            "Pendulum step {}: u = {u:.3}, theta = {:.3}, reward = {:.3}",
            self.steps_taken,
            angle_normalize(self.theta),
            -cost,
        );

        Ok(Step {
            observation: self.current_observation(),
            action,
            reward: -cost,
            terminated: false,
            truncated: self.steps_taken >= self.config.timelimit,
        })
    }

    fn timelimit(&self) -> usize {
        self.config.timelimit
    }

    fn action_space(&self) -> Vec<usize> {
        vec![1]
    }

    fn action_domain(&self) -> Vec<RangeInclusive<f64>> {
        vec![-self.config.max_torque..=self.config.max_torque]
    }

    fn observation_space(&self) -> Vec<usize> {
        vec![3]
    }

    fn current_observation(&self) -> PendulumObs {
        PendulumObs {
            x: self.theta.cos(),
            y: self.theta.sin(),
            velocity: self.theta_dot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_deterministic_given_a_seed() {
        let mut env = *PendulumEnv::new(Default::default()).unwrap();

        let first = PendulumObs::to_vec(env.reset(42).unwrap());
        let second = PendulumObs::to_vec(env.reset(42).unwrap());

        assert_eq!(first, second);
    }

    #[test]
    fn episodes_truncate_at_the_time_limit() {
        let mut env = *PendulumEnv::new(PendulumConfig {
            timelimit: 5,
            ..Default::default()
        })
        .unwrap();
        env.reset(0).unwrap();

        for i in 1..=5 {
            let step = env.step(PendulumAction { tau: 0.0 }).unwrap();
            assert!(!step.terminated);
            assert_eq!(step.truncated, i == 5);
        }
    }

    #[test]
    fn observations_stay_within_their_domain() {
        let mut env = *PendulumEnv::new(Default::default()).unwrap();
        env.reset(7).unwrap();

        for _ in 0..50 {
            let step = env.step(PendulumAction { tau: 100.0 }).unwrap();
            let obs = PendulumObs::to_vec(step.observation);
            assert!(obs[0].abs() <= 1.0);
            assert!(obs[1].abs() <= 1.0);
            assert!(obs[2].abs() <= env.config.max_speed);
            assert!(step.reward <= 0.0);
        }
    }
}
