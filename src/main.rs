use {
    anyhow::Result,
    candle_core::Device,
    clap::{
        Parser,
        ValueEnum,
    },
    std::path::Path,
    td3_rl::{
        agents::{
            Algorithm,
            SaveableAlgorithm,
            TD3,
        },
        configs::{
            TD3_Config,
            TestConfig,
            TrainConfig,
        },
        engines::{
            evaluation_loop_off_policy,
            training_loop_off_policy,
        },
        envs::{
            Environment,
            PendulumEnv,
        },
        logging::setup_logging,
        util::write_config,
    },
    tracing::Level,
};

#[derive(ValueEnum, Debug, Clone)]
enum Mode {
    Train,
    Test,
}

#[derive(ValueEnum, Debug, Clone)]
enum Loglevel {
    Error, // put these only during active debugging and then downgrade later
    Warn,  // main events in the program
    Info,  // all the little details
    None,  // don't log anything
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Train a fresh agent or evaluate a previously saved one.
    #[arg(long, value_enum)]
    mode: Mode,

    /// Setup logging
    #[arg(long, value_enum, default_value_t=Loglevel::None)]
    log: Loglevel,

    /// Directory holding the model parameter files.
    #[arg(long, default_value = "data")]
    model_dir: String,

    /// Name prefix for the model parameter files.
    #[arg(long, default_value = "pendulum")]
    name: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.log {
        Loglevel::Error => setup_logging(
            "debug.log",
            Some(Level::ERROR),
            Some(Level::ERROR),
        )?,
        Loglevel::Warn => setup_logging(
            "debug.log",
            Some(Level::WARN),
            Some(Level::WARN),
        )?,
        Loglevel::Info => setup_logging(
            "debug.log",
            Some(Level::INFO),
            Some(Level::INFO),
        )?,
        Loglevel::None => (),
    };

    let device = Device::Cpu;
    let model_dir = Path::new(&args.model_dir);

    let mut env = *PendulumEnv::new(Default::default())?;
    let config = TD3_Config::pendulum();
    let mut agent = *TD3::from_config(
        &device,
        &config,
        env.observation_space().iter().product::<usize>(),
        &env.action_domain(),
    )?;

    match args.mode {
        Mode::Train => {
            training_loop_off_policy(
                &mut env,
                &mut agent,
                TrainConfig::pendulum(),
                &device,
            )?;
            agent.save(model_dir, &args.name)?;
            write_config(
                &config,
                model_dir.join(format!("{}-config.ron", args.name)),
            )?;
        }
        Mode::Test => {
            // evaluation cannot run on randomly initialized parameters, so
            // a missing checkpoint aborts here
            agent.load(model_dir, &args.name)?;
            evaluation_loop_off_policy(
                &mut env,
                &mut agent,
                TestConfig::default(),
                &device,
            )?;
        }
    }
    Ok(())
}
