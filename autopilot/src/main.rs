use anyhow::{anyhow, Context, Result};
use arena_autopilot::benchmark::{run_benchmark, BenchmarkConfig};
use arena_autopilot::config::{load_config, LabConfig, PRESET_NAMES};
use arena_autopilot::leaderboard_store::{init_leaderboard, read_leaderboard, submit_score};
use arena_autopilot::policies::{create_policy, describe_policies, policy_ids, AgentPolicy};
use arena_autopilot::population::{
    load_champion, load_population, population_from_config, population_from_ids, random_networks,
    save_champion, save_population, ChampionRecord,
};
use arena_autopilot::runner::{run_evaluation, run_play, write_tape};
use arena_autopilot::util::{
    default_out_dir, parse_seed, resolve_seeds, seed_to_hex, write_json, DEFAULT_SEED_START,
};
use arena_core::constants::MAX_TAPE_TICKS_DEFAULT;
use arena_core::sim::AgentStatus;
use arena_core::tape::parse_tape;
use arena_core::verify_tape;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arena-autopilot")]
#[command(about = "Headless lab for the falling-hazard arena: evaluate policies, play, replay tapes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the lab config comes from. A file wins over a preset.
#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    preset: Option<String>,
}

impl ConfigArgs {
    fn load(&self) -> Result<LabConfig> {
        load_config(self.config.as_deref(), self.preset.as_deref())
    }
}

/// Which agents to field. A population file wins over a roster list, which
/// wins over the config.
#[derive(Args, Debug)]
struct PopulationArgs {
    /// JSON array of networks
    #[arg(long)]
    population: Option<PathBuf>,
    /// Comma-separated roster ids, e.g. `tracker,idle,tracker-eager`
    #[arg(long)]
    policies: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List roster policies
    ListPolicies,
    /// Print the resolved lab config as JSON
    ShowConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Draw a random network population and write it as JSON
    SpawnPopulation {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Run one population against one seed
    Evaluate {
        #[arg(long)]
        seed: String,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        population: PopulationArgs,
        #[arg(long)]
        hazard_cap: Option<u32>,
        /// Where to write the champion record
        #[arg(long)]
        champion_out: Option<PathBuf>,
        /// Where to write render snapshots as a JSON array
        #[arg(long)]
        snapshots_out: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        snapshot_every: u32,
    },
    /// Run one population against many seeds in parallel
    Benchmark {
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        population: PopulationArgs,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long)]
        seed_count: Option<u32>,
        #[arg(long)]
        hazard_cap: Option<u32>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Play one headless session with a policy at the controls
    Play {
        /// Roster id
        #[arg(long, conflicts_with = "champion")]
        policy: Option<String>,
        /// Champion record written by `evaluate` or `benchmark`
        #[arg(long)]
        champion: Option<PathBuf>,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 18_000)]
        max_ticks: u32,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Leaderboard file to submit the final score to
        #[arg(long)]
        leaderboard: Option<PathBuf>,
    },
    /// Verify a recorded tape by replaying it
    Replay {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = MAX_TAPE_TICKS_DEFAULT)]
        max_ticks: u32,
    },
    /// Inspect or update a leaderboard file
    Leaderboard {
        #[arg(long, default_value = "leaderboard.txt")]
        path: PathBuf,
        #[command(subcommand)]
        action: LeaderboardAction,
    },
}

#[derive(Subcommand, Debug)]
enum LeaderboardAction {
    Show,
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    Submit {
        #[arg(long)]
        score: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ListPolicies => {
            for (id, description) in describe_policies() {
                println!("{id:16} {description}");
            }
        }
        Commands::ShowConfig { config } => {
            let config = config.load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("presets={}", PRESET_NAMES.join(","));
        }
        Commands::SpawnPopulation {
            config,
            seed,
            output,
        } => {
            let config = config.load()?;
            let seed = seed
                .as_deref()
                .map(parse_seed)
                .transpose()?
                .unwrap_or(DEFAULT_SEED_START);
            let networks = random_networks(&config, seed);
            save_population(&output, &networks)?;
            println!("seed={}", seed_to_hex(seed));
            println!("networks={}", networks.len());
            println!("hidden_units={}", config.hidden_units);
            println!("output={}", output.display());
        }
        Commands::Evaluate {
            seed,
            config,
            population,
            hazard_cap,
            champion_out,
            snapshots_out,
            snapshot_every,
        } => {
            let config = config.load()?;
            let seed = parse_seed(&seed)?;
            let policies = resolve_population(&population, &config, seed)?;
            let hazard_cap = hazard_cap.unwrap_or(config.hazard_cap);
            let snapshot_every = snapshots_out.as_ref().map(|_| snapshot_every);

            let run = run_evaluation(policies, seed, hazard_cap, snapshot_every)?;
            let outcome = &run.outcome;

            println!("seed={}", seed_to_hex(seed));
            println!("termination={:?}", outcome.termination);
            println!("ticks={}", outcome.ticks);
            println!("hazards_spawned={}", outcome.hazards_spawned);

            let mut ranked: Vec<_> = outcome.standings.iter().collect();
            ranked.sort_by(|a, b| {
                b.fitness
                    .total_cmp(&a.fitness)
                    .then_with(|| a.agent.cmp(&b.agent))
            });
            println!("top agents:");
            for standing in ranked.iter().take(5) {
                let status = match standing.status {
                    AgentStatus::Surviving => "surviving".to_string(),
                    AgentStatus::Eliminated { tick, cause } => format!("{cause}@{tick}"),
                };
                println!(
                    "  {} fitness={:.2} hits={} wasted={} {}",
                    standing.agent,
                    standing.fitness,
                    standing.hits,
                    standing.wasted_projectiles,
                    status
                );
            }

            if let Some(champion) = &outcome.champion {
                println!("champion={} fitness={:.2}", champion.agent, champion.fitness);
                if let Some(path) = &champion_out {
                    save_champion(path, &ChampionRecord::new(seed, champion.clone()))?;
                    println!("champion_out={}", path.display());
                }
            } else {
                println!("champion=none");
            }

            if let Some(path) = &snapshots_out {
                write_json(path, &run.snapshots)?;
                println!("snapshots={}", run.snapshots.len());
                println!("snapshots_out={}", path.display());
            }
        }
        Commands::Benchmark {
            config,
            population,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            hazard_cap,
            out_dir,
            jobs,
        } => {
            let config = config.load()?;
            let seeds = if seeds.is_none() && seed_file.is_none() && !config.seeds.is_empty() {
                config.seeds.clone()
            } else {
                resolve_seeds(
                    seeds.as_deref(),
                    seed_file.as_deref(),
                    seed_start.as_deref(),
                    seed_count.unwrap_or(config.seed_count),
                )?
            };
            let population_seed = seeds.first().copied().unwrap_or(DEFAULT_SEED_START);
            let policies = resolve_population(&population, &config, population_seed)?;
            let out_dir = out_dir.unwrap_or_else(|| default_out_dir("benchmarks/run"));

            let report = run_benchmark(BenchmarkConfig {
                policies,
                seeds,
                hazard_cap: hazard_cap.unwrap_or(config.hazard_cap),
                out_dir: out_dir.clone(),
                jobs,
            })?;

            println!("runs={}", report.run_count);
            println!("population={}", report.population);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("top agents:");
            for (idx, agent) in report.rankings.iter().take(5).enumerate() {
                println!(
                    "  {}. agent#{} ({})  mean={:.2} max={:.2} min={:.2} hits={:.1} wasted={:.1} survival={:.0}% champion_runs={}",
                    idx + 1,
                    agent.agent,
                    agent.policy_kind,
                    agent.mean_fitness,
                    agent.max_fitness,
                    agent.min_fitness,
                    agent.mean_hits,
                    agent.mean_wasted,
                    agent.survival_rate * 100.0,
                    agent.champion_runs,
                );
            }
            if let Some(path) = &report.best_champion {
                println!("best_champion={}", path.display());
            }
        }
        Commands::Play {
            policy,
            champion,
            seed,
            max_ticks,
            output,
            leaderboard,
        } => {
            let seed = parse_seed(&seed)?;
            let policy = resolve_play_policy(policy.as_deref(), champion.as_deref())?;
            let artifact = run_play(policy, seed, max_ticks)?;
            let metrics = &artifact.metrics;

            println!("policy={}", metrics.policy_kind);
            println!("seed={}", seed_to_hex(seed));
            println!("ticks={}", metrics.tick_count);
            println!("score={}", metrics.final_score);
            println!("lives={}", metrics.final_lives);
            println!("game_over={}", metrics.game_over);
            println!("hazards_destroyed={}", metrics.hazards_destroyed);
            println!("lives_lost={}", metrics.lives_lost);
            println!("rng={:#010x}", metrics.final_rng_state);

            if let Some(path) = output {
                write_tape(&path, &artifact.tape)?;
                println!("output={}", path.display());
            }
            if let Some(path) = leaderboard {
                match submit_score(&path, metrics.final_score)? {
                    Some(rank) => println!("leaderboard_rank={}", rank + 1),
                    None => println!("leaderboard_rank=none"),
                }
            }
        }
        Commands::Replay { input, max_ticks } => {
            let bytes =
                fs::read(&input).with_context(|| format!("failed reading {}", input.display()))?;
            let tape = parse_tape(&bytes, max_ticks)?;
            let result = verify_tape(&bytes, max_ticks)?;
            println!("input={}", input.display());
            println!("seed={}", seed_to_hex(tape.header.seed));
            println!("tick_count={}", result.tick_count);
            println!("final_score={}", result.final_score);
            println!("final_rng_state={:#010x}", result.final_rng_state);
            println!("verified=true");
        }
        Commands::Leaderboard { path, action } => match action {
            LeaderboardAction::Show => {
                let board = read_leaderboard(&path)?;
                for (idx, score) in board.scores().iter().enumerate() {
                    println!("{:>2}. {score}", idx + 1);
                }
            }
            LeaderboardAction::Init { force } => {
                init_leaderboard(&path, force)?;
                println!("initialized={}", path.display());
            }
            LeaderboardAction::Submit { score } => match submit_score(&path, score)? {
                Some(rank) => println!("rank={}", rank + 1),
                None => println!("rank=none (lowest={})", read_leaderboard(&path)?.lowest()),
            },
        },
    }

    Ok(())
}

fn resolve_population(
    args: &PopulationArgs,
    config: &LabConfig,
    seed: u32,
) -> Result<Vec<AgentPolicy>> {
    if let Some(path) = &args.population {
        return Ok(load_population(path)?
            .into_iter()
            .map(AgentPolicy::Network)
            .collect());
    }
    if let Some(csv) = &args.policies {
        return population_from_ids(csv);
    }
    Ok(population_from_config(config, seed))
}

fn resolve_play_policy(id: Option<&str>, champion: Option<&Path>) -> Result<AgentPolicy> {
    if let Some(path) = champion {
        return Ok(load_champion(path)?.policy);
    }
    let id = id.unwrap_or("tracker");
    create_policy(id).ok_or_else(|| {
        anyhow!(
            "unknown policy '{id}'. available: {}",
            policy_ids().join(", ")
        )
    })
}
