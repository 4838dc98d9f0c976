use {
    crate::{
        agents::{
            Algorithm,
            OffPolicyAlgorithm,
            RunMode,
        },
        configs::{
            AlgorithmConfig,
            TrainConfig,
        },
        envs::{
            Environment,
            Sampleable,
            TensorConvertible,
        },
    },
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    rand::Rng,
    tracing::warn,
};

/// Train an off-policy algorithm on an environment until the total
/// environment-step budget is spent.
///
/// During the agent's first `explore_steps` environment steps, actions are
/// sampled uniformly from the action domain instead of from the policy;
/// after that, every environment step triggers exactly one update call on
/// the agent.
///
/// # Arguments
///
/// * `env` - The environment to train on.
/// * `agent` - The agent to train.
/// * `config` - The configuration for the run.
/// * `device` - The device to run on.
pub fn training_loop_off_policy<Alg, Env, Obs, Act>(
    env: &mut Env,
    agent: &mut Alg,
    config: TrainConfig,
    device: &Device,
) -> Result<Vec<f64>>
where
    Env: Environment<Action = Act, Observation = Obs>,
    Alg: Algorithm + OffPolicyAlgorithm,
    Alg::Config: AlgorithmConfig,
    Obs: Clone + TensorConvertible,
    Act: Clone + TensorConvertible + Sampleable,
{
    warn!("action space: {:?}", env.action_space());
    warn!("observation space: {:?}", env.observation_space());

    let mut mc_returns = Vec::new();
    let mut episode = 0;
    let mut rng = rand::thread_rng();

    while agent.total_env_steps() < config.max_steps() {
        let mut total_reward = 0.0;
        episode += 1;
        env.reset(rng.gen::<u64>())?;

        loop {
            let state = &<Obs>::to_tensor(env.current_observation(), device)?;

            // select an action, or randomly sample one during exploration
            let explore_steps = agent.config().explore_steps();
            let action = &if agent.total_env_steps() < explore_steps {
                <Act>::to_tensor(<Act>::sample(&mut rng, &env.action_domain()), device)?
            } else {
                agent.actions(state, RunMode::Train)?
            };

            let step = env.step(<Act>::from_tensor(action.clone()))?;
            agent.register_env_step();
            total_reward += step.reward;

            agent.remember(
                state,
                action,
                &Tensor::new(vec![step.reward], device)?,
                &<Obs>::to_tensor(step.observation, device)?,
                &Tensor::new(vec![f64::from(step.terminated as u8)], device)?,
            );

            if agent.total_env_steps() >= explore_steps {
                agent.train()?;
            }

            if step.terminated || step.truncated {
                break;
            }
        }

        warn!(
            "episode {episode} with total reward of {total_reward} ({} total steps)",
            agent.total_env_steps(),
        );
        mc_returns.push(total_reward);
    }
    Ok(mc_returns)
}
