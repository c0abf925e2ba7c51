use crate::policies::AgentPolicy;
use crate::population::{save_champion, ChampionRecord};
use crate::runner::{run_evaluation, EvaluationRun};
use crate::util::{seed_to_hex, unix_now, write_json};
use anyhow::{anyhow, Context, Result};
use arena_core::sim::{AgentStatus, Termination};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub policies: Vec<AgentPolicy>,
    pub seeds: Vec<u32>,
    pub hazard_cap: u32,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

/// One agent's result on one seed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub seed: u32,
    pub seed_hex: String,
    pub agent: u32,
    pub policy_kind: String,
    pub fitness: f64,
    pub hits: u32,
    pub wasted_projectiles: u32,
    pub survived: bool,
    pub eliminated_tick: Option<u32>,
    pub cause: Option<String>,
    pub champion: bool,
    pub termination: Termination,
    pub run_ticks: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentAggregate {
    pub agent: u32,
    pub policy_kind: String,
    pub runs: usize,
    pub mean_fitness: f64,
    pub max_fitness: f64,
    pub min_fitness: f64,
    pub mean_hits: f64,
    pub mean_wasted: f64,
    pub survival_rate: f64,
    pub champion_runs: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub hazard_cap: u32,
    pub jobs: Option<usize>,
    pub population: usize,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub rankings: Vec<AgentAggregate>,
    pub runs: Vec<RunRecord>,
    pub best_champion: Option<PathBuf>,
}

/// Evaluates the same population once per seed, in parallel, and ranks
/// agents by mean fitness across seeds.
pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.policies.is_empty() {
        return Err(anyhow!("benchmark requires at least one policy"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    info!(
        seeds = config.seeds.len(),
        population = config.policies.len(),
        hazard_cap = config.hazard_cap,
        "benchmark started"
    );

    let run_one = |seed: &u32| -> Result<EvaluationRun> {
        run_evaluation(config.policies.clone(), *seed, config.hazard_cap, None)
            .with_context(|| format!("benchmark run failed for seed={seed:#010x}"))
    };

    let results: Vec<Result<EvaluationRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| config.seeds.par_iter().map(run_one).collect())
    } else {
        config.seeds.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(results.len());
    for result in results {
        runs.push(result?);
    }

    let records: Vec<RunRecord> = runs
        .iter()
        .flat_map(|run| run_records(run, &config.policies))
        .collect();
    let rankings = aggregate(&records, &config.policies);
    let best_champion = save_best_champion(&config.out_dir, &runs)?;

    write_runs_csv(&config.out_dir.join("runs.csv"), &records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: unix_now(),
        hazard_cap: config.hazard_cap,
        jobs: config.jobs,
        population: config.policies.len(),
        seeds: config.seeds,
        run_count: runs.len(),
        rankings,
        runs: records,
        best_champion,
    };
    write_json(&config.out_dir.join("summary.json"), &report)?;

    info!(runs = report.run_count, "benchmark finished");
    Ok(report)
}

fn policy_kind(policies: &[AgentPolicy], agent: u32) -> String {
    policies
        .get(agent as usize)
        .map_or("unknown", AgentPolicy::kind)
        .to_string()
}

fn run_records(run: &EvaluationRun, policies: &[AgentPolicy]) -> Vec<RunRecord> {
    let champion = run.outcome.champion.as_ref().map(|c| c.agent);

    run.outcome
        .standings
        .iter()
        .map(|standing| {
            let (survived, eliminated_tick, cause) = match standing.status {
                AgentStatus::Surviving => (true, None, None),
                AgentStatus::Eliminated { tick, cause } => {
                    (false, Some(tick), Some(cause.to_string()))
                }
            };
            RunRecord {
                seed: run.seed,
                seed_hex: seed_to_hex(run.seed),
                agent: standing.agent.0,
                policy_kind: policy_kind(policies, standing.agent.0),
                fitness: standing.fitness,
                hits: standing.hits,
                wasted_projectiles: standing.wasted_projectiles,
                survived,
                eliminated_tick,
                cause,
                champion: champion == Some(standing.agent),
                termination: run.outcome.termination,
                run_ticks: run.outcome.ticks,
            }
        })
        .collect()
}

fn aggregate(records: &[RunRecord], policies: &[AgentPolicy]) -> Vec<AgentAggregate> {
    let mut grouped: BTreeMap<u32, Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.agent).or_default().push(record);
    }

    let mut rankings: Vec<AgentAggregate> = grouped
        .into_iter()
        .map(|(agent, rows)| {
            let runs = rows.len();
            let n = runs as f64;
            let fitness = rows.iter().map(|r| r.fitness);
            AgentAggregate {
                agent,
                policy_kind: policy_kind(policies, agent),
                runs,
                mean_fitness: fitness.clone().sum::<f64>() / n,
                max_fitness: fitness.clone().fold(f64::NEG_INFINITY, f64::max),
                min_fitness: fitness.fold(f64::INFINITY, f64::min),
                mean_hits: rows.iter().map(|r| r.hits as f64).sum::<f64>() / n,
                mean_wasted: rows.iter().map(|r| r.wasted_projectiles as f64).sum::<f64>() / n,
                survival_rate: rows.iter().filter(|r| r.survived).count() as f64 / n,
                champion_runs: rows.iter().filter(|r| r.champion).count(),
            }
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.mean_fitness
            .total_cmp(&a.mean_fitness)
            .then_with(|| b.max_fitness.total_cmp(&a.max_fitness))
            .then_with(|| a.agent.cmp(&b.agent))
    });
    rankings
}

fn save_best_champion(out_dir: &Path, runs: &[EvaluationRun]) -> Result<Option<PathBuf>> {
    let best = runs
        .iter()
        .filter_map(|run| run.outcome.champion.as_ref().map(|c| (run.seed, c)))
        .max_by(|(_, a), (_, b)| a.fitness.total_cmp(&b.fitness));

    let Some((seed, champion)) = best else {
        return Ok(None);
    };
    let path = out_dir.join("champion.json");
    save_champion(&path, &ChampionRecord::new(seed, champion.clone()))?;
    Ok(Some(path))
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "seed_hex,seed,agent,policy_kind,fitness,hits,wasted_projectiles,survived,eliminated_tick,cause,champion,termination,run_ticks\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{:.2},{},{},{},{},{},{},{:?},{}\n",
            row.seed_hex,
            row.seed,
            row.agent,
            row.policy_kind,
            row.fitness,
            row.hits,
            row.wasted_projectiles,
            row.survived,
            row.eliminated_tick.map(|t| t.to_string()).unwrap_or_default(),
            row.cause.as_deref().unwrap_or(""),
            row.champion,
            row.termination,
            row.run_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[AgentAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,agent,policy_kind,runs,mean_fitness,max_fitness,min_fitness,mean_hits,mean_wasted,survival_rate,champion_runs\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.4},{}\n",
            idx + 1,
            row.agent,
            row.policy_kind,
            row.runs,
            row.mean_fitness,
            row.max_fitness,
            row.min_fitness,
            row.mean_hits,
            row.mean_wasted,
            row.survival_rate,
            row.champion_runs
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
