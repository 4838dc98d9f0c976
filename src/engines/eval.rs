use {
    crate::{
        agents::{
            Algorithm,
            RunMode,
        },
        configs::TestConfig,
        envs::{
            Environment,
            TensorConvertible,
        },
    },
    anyhow::Result,
    candle_core::Device,
    rand::Rng,
    tracing::warn,
};

/// Run greedy evaluation episodes with a trained agent.
///
/// The agent's parameters must have been restored beforehand; actions are
/// taken in [`RunMode::Test`], without exploration noise, and nothing is
/// stored or trained.
///
/// # Arguments
///
/// * `env` - The environment to evaluate on.
/// * `agent` - The trained agent.
/// * `config` - The configuration for the run.
/// * `device` - The device to run on.
pub fn evaluation_loop_off_policy<Alg, Env, Obs, Act>(
    env: &mut Env,
    agent: &mut Alg,
    config: TestConfig,
    device: &Device,
) -> Result<Vec<f64>>
where
    Env: Environment<Action = Act, Observation = Obs>,
    Alg: Algorithm,
    Obs: Clone + TensorConvertible,
    Act: Clone + TensorConvertible,
{
    let mut mc_returns = Vec::new();
    let mut rng = rand::thread_rng();

    for episode in 0..config.max_episodes() {
        let mut total_reward = 0.0;
        env.reset(rng.gen::<u64>())?;

        loop {
            let state = &<Obs>::to_tensor(env.current_observation(), device)?;
            let action = agent.actions(state, RunMode::Test)?;

            let step = env.step(<Act>::from_tensor(action))?;
            total_reward += step.reward;

            if step.terminated || step.truncated {
                break;
            }
        }

        warn!("evaluation episode {episode} with total reward of {total_reward}");
        mc_returns.push(total_reward);
    }
    Ok(mc_returns)
}
