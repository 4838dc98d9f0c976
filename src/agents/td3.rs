use {
    super::{
        Algorithm,
        OffPolicyAlgorithm,
        RunMode,
        SaveableAlgorithm,
    },
    crate::{
        components::{
            ActionBound,
            GaussianNoise,
            ReplayBuffer,
        },
        configs::TD3_Config,
        error::{
            Result,
            Td3Error,
        },
    },
    candle_core::{
        safetensors,
        DType,
        Device,
        Error,
        Module,
        Tensor,
        Var,
    },
    candle_nn::{
        func,
        linear,
        sequential::seq,
        Activation,
        AdamW,
        Optimizer,
        ParamsAdamW,
        Sequential,
        VarBuilder,
        VarMap,
    },
    std::{
        collections::HashMap,
        ops::RangeInclusive,
        path::Path,
    },
    tracing::info,
};

/// Polyak-average the parameters behind `target_prefix` toward the ones
/// behind `network_prefix`: `target = tau * network + (1 - tau) * target`.
///
/// Parameters are matched by name, never by iteration order, so the two
/// networks must have been built with identical layer dimensions.
fn track(
    varmap: &mut VarMap,
    vb: &VarBuilder,
    target_prefix: &str,
    network_prefix: &str,
    dims: &[(usize, usize)],
    tau: f64,
) -> Result<()> {
    for (i, &(in_dim, out_dim)) in dims.iter().enumerate() {
        let target_w = vb.get((out_dim, in_dim), &format!("{target_prefix}-fc{i}.weight"))?;
        let network_w = vb.get((out_dim, in_dim), &format!("{network_prefix}-fc{i}.weight"))?;
        varmap.set_one(
            format!("{target_prefix}-fc{i}.weight"),
            ((tau * network_w)? + ((1.0 - tau) * target_w)?)?,
        )?;

        let target_b = vb.get(out_dim, &format!("{target_prefix}-fc{i}.bias"))?;
        let network_b = vb.get(out_dim, &format!("{network_prefix}-fc{i}.bias"))?;
        varmap.set_one(
            format!("{target_prefix}-fc{i}.bias"),
            ((tau * network_b)? + ((1.0 - tau) * target_b)?)?,
        )?;
    }
    Ok(())
}

/// Collect the parameter tensors behind one role prefix into a safetensors
/// file of their own.
fn save_role(
    varmap: &VarMap,
    prefix: &str,
    file: &Path,
) -> Result<()> {
    let prefix = format!("{prefix}-fc");
    let data = varmap.data().lock().unwrap();
    let tensors: HashMap<String, Tensor> = data
        .iter()
        .filter(|(name, _)| name.starts_with(&prefix))
        .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
        .collect();
    Ok(safetensors::save(&tensors, file)?)
}

/// Restore one role's parameters from its safetensors file, matching by
/// parameter name. A missing file is a [`Td3Error::MissingCheckpoint`].
fn load_role(
    varmap: &mut VarMap,
    file: &Path,
    device: &Device,
) -> Result<()> {
    if !file.exists() {
        return Err(Td3Error::MissingCheckpoint(file.to_path_buf()));
    }
    for (name, tensor) in safetensors::load(file, device)? {
        varmap.set_one(name, tensor)?;
    }
    Ok(())
}

/// The policy network and its slowly-tracking target copy.
///
/// Two hidden ReLU layers and a `tanh` head, scaled by the upper action
/// bound. Both copies live in one `VarMap` under the `actor-*` and
/// `target-actor-*` prefixes.
struct Actor<'a> {
    varmap: VarMap,
    vb: VarBuilder<'a>,
    network: Sequential,
    target_network: Sequential,
    scale: Tensor,
    dims: Vec<(usize, usize)>,
}

impl Actor<'_> {
    fn new(
        device: &Device,
        dtype: DType,
        dims: &[(usize, usize)],
        scale: Tensor,
    ) -> Result<Self> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, device);

        let make_network = |prefix: &str| {
            let seq = seq()
                .add(linear(
                    dims[0].0,
                    dims[0].1,
                    vb.pp(format!("{prefix}-fc0")),
                )?)
                .add(Activation::Relu)
                .add(linear(
                    dims[1].0,
                    dims[1].1,
                    vb.pp(format!("{prefix}-fc1")),
                )?)
                .add(Activation::Relu)
                .add(linear(
                    dims[2].0,
                    dims[2].1,
                    vb.pp(format!("{prefix}-fc2")),
                )?)
                .add(func(|xs| xs.tanh()));
            Ok::<Sequential, Error>(seq)
        };

        let network = make_network("actor")?;
        let target_network = make_network("target-actor")?;

        // this sets the two networks to be equal to each other using tau = 1.0
        track(&mut varmap, &vb, "target-actor", "actor", dims, 1.0)?;

        Ok(Self {
            varmap,
            vb,
            network,
            target_network,
            scale,
            dims: dims.to_vec(),
        })
    }

    fn forward(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        Ok(self.network.forward(state)?.broadcast_mul(&self.scale)?)
    }

    fn target_forward(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        Ok(self
            .target_network
            .forward(state)?
            .broadcast_mul(&self.scale)?)
    }

    fn track(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        track(
            &mut self.varmap,
            &self.vb,
            "target-actor",
            "actor",
            &self.dims,
            tau,
        )
    }
}

/// One value network and its slowly-tracking target copy.
///
/// Takes the concatenated `(state, action)` vector through two hidden ReLU
/// layers and a linear scalar head. TD3 maintains two of these with their
/// own `VarMap`s, so the twins never share parameters or gradients.
struct Critic<'a> {
    varmap: VarMap,
    vb: VarBuilder<'a>,
    network: Sequential,
    target_network: Sequential,
    prefix: String,
    target_prefix: String,
    dims: Vec<(usize, usize)>,
}

impl Critic<'_> {
    fn new(
        device: &Device,
        dtype: DType,
        dims: &[(usize, usize)],
        prefix: &str,
    ) -> Result<Self> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, device);
        let target_prefix = format!("target-{prefix}");

        let make_network = |prefix: &str| {
            let seq = seq()
                .add(linear(
                    dims[0].0,
                    dims[0].1,
                    vb.pp(format!("{prefix}-fc0")),
                )?)
                .add(Activation::Relu)
                .add(linear(
                    dims[1].0,
                    dims[1].1,
                    vb.pp(format!("{prefix}-fc1")),
                )?)
                .add(Activation::Relu)
                .add(linear(
                    dims[2].0,
                    dims[2].1,
                    vb.pp(format!("{prefix}-fc2")),
                )?);
            Ok::<Sequential, Error>(seq)
        };

        let network = make_network(prefix)?;
        let target_network = make_network(&target_prefix)?;

        // this sets the two networks to be equal to each other using tau = 1.0
        track(&mut varmap, &vb, &target_prefix, prefix, dims, 1.0)?;

        Ok(Self {
            varmap,
            vb,
            network,
            target_network,
            prefix: prefix.to_string(),
            target_prefix,
            dims: dims.to_vec(),
        })
    }

    fn forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[state, action], 1)?;
        Ok(self.network.forward(&xs)?)
    }

    fn target_forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[state, action], 1)?;
        Ok(self.target_network.forward(&xs)?)
    }

    fn track(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        track(
            &mut self.varmap,
            &self.vb,
            &self.target_prefix,
            &self.prefix,
            &self.dims,
            tau,
        )
    }
}

/// Twin-Delayed Deep Deterministic Policy Gradient.
///
/// An off-policy actor-critic algorithm for continuous action spaces. It
/// extends DDPG with three bias-reduction mechanisms:
///
/// 1. Twin critics: the regression target uses the elementwise minimum of
///    two independently trained value estimates, countering the
///    overestimation bias of a single critic.
/// 2. Delayed policy updates: the actor and all three target networks are
///    only updated every `policy_update` critic updates.
/// 3. Target-policy smoothing: clipped Gaussian noise is added to the
///    target actor's action before the target critics evaluate it.
#[allow(clippy::upper_case_acronyms)]
pub struct TD3<'a> {
    config: TD3_Config,
    actor: Actor<'a>,
    actor_optim: AdamW,
    critic1: Critic<'a>,
    critic1_optim: AdamW,
    critic2: Critic<'a>,
    critic2_optim: AdamW,
    replay_buffer: ReplayBuffer,
    action_bound: ActionBound,
    explore_noise: GaussianNoise,
    policy_noise: GaussianNoise,

    total_env_steps: usize,
    total_update_steps: usize,

    size_state: usize,
    size_action: usize,
    device: Device,
}

impl TD3<'_> {
    pub fn new(
        device: &Device,
        config: TD3_Config,
        size_state: usize,
        action_domain: &[RangeInclusive<f64>],
    ) -> Result<Self> {
        let filter_by_prefix = |varmap: &VarMap, prefix: &str| {
            varmap
                .data()
                .lock()
                .unwrap()
                .iter()
                .filter_map(|(name, var)| name.starts_with(prefix).then_some(var.clone()))
                .collect::<Vec<Var>>()
        };

        let size_action = action_domain.len();
        let action_bound = ActionBound::new(action_domain, device)?;

        let actor = Actor::new(
            device,
            DType::F64,
            &[
                (size_state, config.hidden_1_size),
                (config.hidden_1_size, config.hidden_2_size),
                (config.hidden_2_size, size_action),
            ],
            action_bound.scale().clone(),
        )?;
        let actor_optim = AdamW::new(
            filter_by_prefix(&actor.varmap, "actor"),
            ParamsAdamW {
                lr: config.actor_learning_rate,
                ..Default::default()
            },
        )?;

        let critic_dims = [
            (size_state + size_action, config.hidden_1_size),
            (config.hidden_1_size, config.hidden_2_size),
            (config.hidden_2_size, 1),
        ];
        let critic1 = Critic::new(device, DType::F64, &critic_dims, "critic1")?;
        let critic1_optim = AdamW::new(
            filter_by_prefix(&critic1.varmap, "critic1"),
            ParamsAdamW {
                lr: config.critic_learning_rate,
                ..Default::default()
            },
        )?;
        let critic2 = Critic::new(device, DType::F64, &critic_dims, "critic2")?;
        let critic2_optim = AdamW::new(
            filter_by_prefix(&critic2.varmap, "critic2"),
            ParamsAdamW {
                lr: config.critic_learning_rate,
                ..Default::default()
            },
        )?;

        Ok(Self {
            replay_buffer: ReplayBuffer::new(config.replay_buffer_capacity),
            explore_noise: GaussianNoise::new(config.explore_noise),
            policy_noise: GaussianNoise::new(config.policy_noise),
            config,
            actor,
            actor_optim,
            critic1,
            critic1_optim,
            critic2,
            critic2_optim,
            action_bound,
            total_env_steps: 0,
            total_update_steps: 0,
            size_state,
            size_action,
            device: device.clone(),
        })
    }

    pub fn size_state(&self) -> usize {
        self.size_state
    }

    pub fn size_action(&self) -> usize {
        self.size_action
    }

    /// The number of update calls so far; gates the delayed actor and
    /// target-network updates.
    pub fn total_update_steps(&self) -> usize {
        self.total_update_steps
    }

    pub fn action_bound(&self) -> &ActionBound {
        &self.action_bound
    }

    /// Action selection takes a single unbatched state vector; anything
    /// else gets a [`Td3Error::ShapeMismatch`] before it can reach candle.
    fn check_state(
        &self,
        state: &Tensor,
    ) -> Result<()> {
        let dims = state.dims();
        if dims.len() != 1 {
            return Err(Td3Error::ShapeMismatch {
                what: "state rank",
                expected: 1,
                got: dims.len(),
            });
        }
        if dims[0] != self.size_state {
            return Err(Td3Error::ShapeMismatch {
                what: "state",
                expected: self.size_state,
                got: dims[0],
            });
        }
        Ok(())
    }

    /// The fixed regression target for both critics.
    ///
    /// Evaluates the target actor on the next states, smooths the resulting
    /// actions with clipped Gaussian noise, clips them into the action
    /// bounds, and takes the elementwise minimum of the two target critics:
    /// `y = r + (1 - done) * gamma * min(Q1'(s', a'), Q2'(s', a'))`.
    ///
    /// The result is detached, so no gradient flows through it.
    fn critic_targets(
        &self,
        rewards: &Tensor,
        next_states: &Tensor,
        dones: &Tensor,
    ) -> Result<Tensor> {
        let next_actions = self.actor.target_forward(next_states)?;
        let noise = self
            .policy_noise
            .sample_clipped(&next_actions, self.config.noise_clip)?;
        let next_actions = self.action_bound.clip(&(next_actions + noise)?)?;

        let q1 = self.critic1.target_forward(next_states, &next_actions)?;
        let q2 = self.critic2.target_forward(next_states, &next_actions)?;
        let q_min = q1.minimum(&q2)?;

        Ok((rewards + ((1.0 - dones)? * (self.config.gamma * q_min)?)?)?.detach())
    }
}

impl Algorithm for TD3<'_> {
    type Config = TD3_Config;

    fn config(&self) -> &TD3_Config {
        &self.config
    }

    fn from_config(
        device: &Device,
        config: &TD3_Config,
        size_state: usize,
        action_domain: &[RangeInclusive<f64>],
    ) -> Result<Box<Self>> {
        Ok(Box::new(Self::new(
            device,
            config.clone(),
            size_state,
            action_domain,
        )?))
    }

    fn actions(
        &mut self,
        state: &Tensor,
        mode: RunMode,
    ) -> Result<Tensor> {
        self.check_state(state)?;
        // Candle assumes a batch dimension, so when we don't have one we need
        // to pretend we do by un- and resqueezing the state tensor.
        let actions = self.actor.forward(&state.detach().unsqueeze(0)?)?.squeeze(0)?;
        Ok(match mode {
            RunMode::Train => {
                let noisy = (actions.clone() + self.explore_noise.sample_like(&actions)?)?;
                self.action_bound.clip(&noisy)?
            }
            RunMode::Test => actions,
        })
    }

    fn train(&mut self) -> Result<()> {
        self.total_update_steps += 1;

        let (states, actions, rewards, next_states, dones) = self
            .replay_buffer
            .random_batch(self.config.training_batch_size)?;

        let q_target = self.critic_targets(&rewards, &next_states, &dones)?;

        // The twins regress on the same target but never share gradients:
        // each loss only reaches its own optimizer.
        let q1 = self.critic1.forward(&states, &actions)?;
        let critic1_loss = (&q_target - q1)?.sqr()?.mean_all()?;
        self.critic1_optim.backward_step(&critic1_loss)?;

        let q2 = self.critic2.forward(&states, &actions)?;
        let critic2_loss = (&q_target - q2)?.sqr()?.mean_all()?;
        self.critic2_optim.backward_step(&critic2_loss)?;

        if self.total_update_steps % self.config.policy_update == 0 {
            // Gradient ascent on critic-1's estimate of the actor's action,
            // implemented as descent on its negation. Only critic-1 feeds
            // the actor's training signal.
            let actor_loss = self
                .critic1
                .forward(&states, &self.actor.forward(&states)?)?
                .mean_all()?
                .neg()?;
            self.actor_optim.backward_step(&actor_loss)?;

            self.actor.track(self.config.tau)?;
            self.critic1.track(self.config.tau)?;
            self.critic2.track(self.config.tau)?;
        }

        Ok(())
    }

    fn total_env_steps(&self) -> usize {
        self.total_env_steps
    }

    fn register_env_step(&mut self) {
        self.total_env_steps += 1;
    }
}

impl OffPolicyAlgorithm for TD3<'_> {
    fn remember(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: &Tensor,
        next_state: &Tensor,
        done: &Tensor,
    ) {
        info!(
            concat!(
                "\nPushing to replay buffer:",
                "\n{state:?}",
                "\n{action:?}",
                "\n{reward:?}",
                "\n{next_state:?}",
            ),
            state = state,
            action = action,
            reward = reward,
            next_state = next_state,
        );
        self.replay_buffer
            .push(state, action, reward, next_state, done)
    }

    fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_buffer
    }
}

impl SaveableAlgorithm for TD3<'_> {
    /// Persist all six parameter sets, one safetensors file per role.
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let file = |role: &str| path.join(format!("{name}-{role}.safetensors"));

        save_role(&self.actor.varmap, "actor", &file("main-actor"))?;
        save_role(&self.actor.varmap, "target-actor", &file("target-actor"))?;
        save_role(&self.critic1.varmap, "critic1", &file("main-critic-1"))?;
        save_role(&self.critic1.varmap, "target-critic1", &file("target-critic-1"))?;
        save_role(&self.critic2.varmap, "critic2", &file("main-critic-2"))?;
        save_role(&self.critic2.varmap, "target-critic2", &file("target-critic-2"))?;
        Ok(())
    }

    /// Restore all six parameter sets. Any missing file fails the whole
    /// load; the caller must not fall back to random parameters silently.
    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = |role: &str| path.join(format!("{name}-{role}.safetensors"));

        for role in [
            "main-actor",
            "target-actor",
            "main-critic-1",
            "target-critic-1",
            "main-critic-2",
            "target-critic-2",
        ] {
            let varmap = if role.contains("actor") {
                &mut self.actor.varmap
            } else if role.contains("critic-1") {
                &mut self.critic1.varmap
            } else {
                &mut self.critic2.varmap
            };
            load_role(varmap, &file(role), &self.device)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        tempdir::TempDir,
    };

    fn test_config() -> TD3_Config {
        TD3_Config {
            actor_learning_rate: 1e-3,
            critic_learning_rate: 1e-3,
            gamma: 0.5,
            tau: 0.05,
            hidden_1_size: 4,
            hidden_2_size: 4,
            replay_buffer_capacity: 64,
            training_batch_size: 4,
            explore_steps: 0,
            policy_update: 2,
            policy_noise: 0.0,
            explore_noise: 0.0,
            noise_clip: 0.5,
        }
    }

    fn test_agent(device: &Device) -> TD3<'static> {
        *TD3::from_config(device, &test_config(), 3, &[-1.0..=1.0]).unwrap()
    }

    fn param(varmap: &VarMap, name: &str) -> Vec<f64> {
        varmap.data().lock().unwrap()[name]
            .as_tensor()
            .flatten_all()
            .unwrap()
            .to_vec1::<f64>()
            .unwrap()
    }

    fn fill_buffer(agent: &mut TD3, n: usize, device: &Device) {
        for _ in 0..n {
            let state = Tensor::randn(0.0, 1.0, 3, device).unwrap();
            let action = Tensor::randn(0.0, 0.5, 1, device).unwrap();
            let reward = Tensor::randn(0.0, 1.0, 1, device).unwrap();
            let next_state = Tensor::randn(0.0, 1.0, 3, device).unwrap();
            let done = Tensor::zeros(1, DType::F64, device).unwrap();
            agent.remember(&state, &action, &reward, &next_state, &done);
        }
    }

    #[test]
    fn soft_update_with_tau_zero_and_one() {
        let device = Device::Cpu;
        let scale = Tensor::ones(1, DType::F64, &device).unwrap();
        let mut actor = Actor::new(
            &device,
            DType::F64,
            &[(3, 4), (4, 4), (4, 1)],
            scale,
        )
        .unwrap();

        // perturb the main network away from the freshly-synced target
        let ones = Tensor::ones((4, 3), DType::F64, &device).unwrap();
        actor.varmap.set_one("actor-fc0.weight", ones).unwrap();
        let target_before = param(&actor.varmap, "target-actor-fc0.weight");

        actor.track(0.0).unwrap();
        assert_eq!(param(&actor.varmap, "target-actor-fc0.weight"), target_before);

        actor.track(1.0).unwrap();
        assert_eq!(
            param(&actor.varmap, "target-actor-fc0.weight"),
            param(&actor.varmap, "actor-fc0.weight"),
        );
    }

    #[test]
    fn critic_targets_use_the_smaller_twin_estimate() {
        let device = Device::Cpu;
        let mut agent = test_agent(&device);

        // zero the target critics' output weights so each one returns
        // exactly its output bias, regardless of the input
        let zeros = Tensor::zeros((1, 4), DType::F64, &device).unwrap();
        let bias = |value: f64| Tensor::new(vec![value], &device).unwrap();
        agent
            .critic1
            .varmap
            .set_one("target-critic1-fc2.weight", zeros.clone())
            .unwrap();
        agent
            .critic1
            .varmap
            .set_one("target-critic1-fc2.bias", bias(2.0))
            .unwrap();
        agent
            .critic2
            .varmap
            .set_one("target-critic2-fc2.weight", zeros)
            .unwrap();
        agent
            .critic2
            .varmap
            .set_one("target-critic2-fc2.bias", bias(5.0))
            .unwrap();

        let rewards = Tensor::zeros((2, 1), DType::F64, &device).unwrap();
        let next_states = Tensor::zeros((2, 3), DType::F64, &device).unwrap();
        let dones = Tensor::zeros((2, 1), DType::F64, &device).unwrap();

        let targets = agent
            .critic_targets(&rewards, &next_states, &dones)
            .unwrap()
            .to_vec2::<f64>()
            .unwrap();

        // gamma = 0.5, so y = 0.5 * min(2.0, 5.0) = 1.0 everywhere
        for row in targets {
            assert!((row[0] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn done_transitions_drop_the_bootstrap_term() {
        let device = Device::Cpu;
        let agent = test_agent(&device);

        let rewards = Tensor::new(vec![vec![3.0]], &device).unwrap();
        let next_states = Tensor::zeros((1, 3), DType::F64, &device).unwrap();
        let dones = Tensor::new(vec![vec![1.0]], &device).unwrap();

        let targets = agent
            .critic_targets(&rewards, &next_states, &dones)
            .unwrap()
            .to_vec2::<f64>()
            .unwrap();

        assert!((targets[0][0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn actor_and_targets_update_only_every_policy_update_calls() {
        let device = Device::Cpu;
        let mut agent = test_agent(&device);
        fill_buffer(&mut agent, 16, &device);

        let actor_main = param(&agent.actor.varmap, "actor-fc0.weight");
        let actor_target = param(&agent.actor.varmap, "target-actor-fc0.weight");
        let critic_main = param(&agent.critic1.varmap, "critic1-fc0.weight");

        // update #1: critics move, actor and targets hold still
        agent.train().unwrap();
        assert_eq!(agent.total_update_steps(), 1);
        assert_ne!(param(&agent.critic1.varmap, "critic1-fc0.weight"), critic_main);
        assert_eq!(param(&agent.actor.varmap, "actor-fc0.weight"), actor_main);
        assert_eq!(
            param(&agent.actor.varmap, "target-actor-fc0.weight"),
            actor_target,
        );

        // update #2: the delayed actor and target updates fire
        agent.train().unwrap();
        assert_eq!(agent.total_update_steps(), 2);
        assert_ne!(param(&agent.actor.varmap, "actor-fc0.weight"), actor_main);
        assert_ne!(
            param(&agent.actor.varmap, "target-actor-fc0.weight"),
            actor_target,
        );
    }

    #[test]
    fn training_without_enough_transitions_fails_fast() {
        let device = Device::Cpu;
        let mut agent = test_agent(&device);
        fill_buffer(&mut agent, 3, &device);

        match agent.train() {
            Err(Td3Error::InsufficientData { requested, available }) => {
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn zero_exploration_noise_selects_the_clipped_policy_action() {
        let device = Device::Cpu;
        let mut agent = test_agent(&device);
        let state = Tensor::randn(0.0, 1.0, 3, &device).unwrap();

        let first = agent
            .actions(&state, RunMode::Train)
            .unwrap()
            .to_vec1::<f64>()
            .unwrap();
        let second = agent
            .actions(&state, RunMode::Train)
            .unwrap()
            .to_vec1::<f64>()
            .unwrap();
        assert_eq!(first, second);

        let greedy = agent.actions(&state, RunMode::Test).unwrap();
        let clipped = agent
            .action_bound
            .clip(&greedy)
            .unwrap()
            .to_vec1::<f64>()
            .unwrap();
        assert_eq!(first, clipped);
    }

    #[test]
    fn state_shape_mismatch_is_rejected() {
        let device = Device::Cpu;
        let mut agent = test_agent(&device);
        let state = Tensor::zeros(5, DType::F64, &device).unwrap();

        match agent.actions(&state, RunMode::Train) {
            Err(Td3Error::ShapeMismatch { expected, got, .. }) => {
                assert_eq!(expected, 3);
                assert_eq!(got, 5);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn batched_states_are_rejected_by_action_selection() {
        let device = Device::Cpu;
        let mut agent = test_agent(&device);
        // right feature dimension, but carrying a batch dimension
        let states = Tensor::zeros((2, 3), DType::F64, &device).unwrap();

        match agent.actions(&states, RunMode::Train) {
            Err(Td3Error::ShapeMismatch { what, expected, got }) => {
                assert_eq!(what, "state rank");
                assert_eq!(expected, 1);
                assert_eq!(got, 2);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn save_and_load_round_trip_all_six_roles() {
        let device = Device::Cpu;
        let saved = test_agent(&device);
        let mut restored = test_agent(&device);

        let dir = TempDir::new("td3-checkpoint").unwrap();
        saved.save(dir.path(), "unit").unwrap();
        restored.load(dir.path(), "unit").unwrap();

        for (varmap_a, varmap_b, names) in [
            (
                &saved.actor.varmap,
                &restored.actor.varmap,
                ["actor-fc0.weight", "target-actor-fc2.bias"],
            ),
            (
                &saved.critic1.varmap,
                &restored.critic1.varmap,
                ["critic1-fc1.weight", "target-critic1-fc2.bias"],
            ),
            (
                &saved.critic2.varmap,
                &restored.critic2.varmap,
                ["critic2-fc0.bias", "target-critic2-fc1.weight"],
            ),
        ] {
            for name in names {
                assert_eq!(param(varmap_a, name), param(varmap_b, name));
            }
        }
    }

    #[test]
    fn loading_a_missing_checkpoint_is_fatal() {
        let device = Device::Cpu;
        let mut agent = test_agent(&device);
        let dir = TempDir::new("td3-empty").unwrap();

        match agent.load(dir.path(), "nope") {
            Err(Td3Error::MissingCheckpoint(file)) => {
                assert!(file.ends_with("nope-main-actor.safetensors"));
            }
            other => panic!("expected MissingCheckpoint, got {other:?}"),
        }
    }
}
