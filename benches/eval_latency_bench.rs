// Evaluation latency benchmark
// Measures end-to-end Evaluator::evaluate latency: spawn, exit watch,
// group sweep, reap and judging, for trivial solutions.
// Target: p50 < 50ms, p95 < 100ms for bash; interpreters get more headroom.

use aocgen::{EvaluationRequest, Evaluator};
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

/// Benchmark configuration
const ITERATIONS: usize = 100;
const WARMUP_ITERATIONS: usize = 10;

/// Latency percentiles
struct LatencyStats {
    p50: Duration,
    p95: Duration,
    p99: Duration,
    min: Duration,
    max: Duration,
    mean: Duration,
}

impl LatencyStats {
    fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let len = samples.len();

        let p50_idx = (len as f64 * 0.50) as usize;
        let p95_idx = (len as f64 * 0.95) as usize;
        let p99_idx = (len as f64 * 0.99) as usize;

        let sum: Duration = samples.iter().sum();
        let mean = sum / len as u32;

        Self {
            p50: samples[p50_idx],
            p95: samples[p95_idx],
            p99: samples[p99_idx],
            min: samples[0],
            max: samples[len - 1],
            mean,
        }
    }

    fn print(&self, label: &str) {
        println!("\n{}", label);
        println!("  p50: {:?}", self.p50);
        println!("  p95: {:?}", self.p95);
        println!("  p99: {:?}", self.p99);
        println!("  min: {:?}", self.min);
        println!("  max: {:?}", self.max);
        println!("  mean: {:?}", self.mean);
    }
}

struct BenchmarkResult {
    scenario: String,
    stats: Option<LatencyStats>,
    passed: bool,
    reason: Option<String>,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n=== {} ===", self.scenario);
        match &self.stats {
            Some(stats) => stats.print("Latency"),
            None => println!("  skipped"),
        }

        match &self.reason {
            None => println!("PASS"),
            Some(reason) if self.passed => println!("SKIP: {}", reason),
            Some(reason) => println!("FAIL: {}", reason),
        }
    }
}

fn available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn benchmark(
    evaluator: &Evaluator,
    dir: &Path,
    scenario: &str,
    language: &str,
    file_name: &str,
    code: &str,
    p50_budget: Duration,
    p95_budget: Duration,
) -> BenchmarkResult {
    let source = dir.join(file_name);
    std::fs::write(&source, code).unwrap();
    let request = EvaluationRequest::new(&source, language, "42", Duration::from_secs(20));

    for _ in 0..WARMUP_ITERATIONS {
        let _ = evaluator.evaluate(&request);
    }

    let mut samples = Vec::with_capacity(ITERATIONS);
    for _ in 0..ITERATIONS {
        let start = Instant::now();
        let verdict = evaluator.evaluate(&request);
        samples.push(start.elapsed());
        if !matches!(verdict, Ok(ref v) if v.matched) {
            return BenchmarkResult {
                scenario: scenario.to_string(),
                stats: None,
                passed: false,
                reason: Some(format!("evaluation did not match: {:?}", verdict)),
            };
        }
    }

    let stats = LatencyStats::from_samples(samples);
    let passed = stats.p50 < p50_budget && stats.p95 < p95_budget;
    let reason = if !passed {
        Some(format!(
            "p50={:?} (target <{:?}), p95={:?} (target <{:?})",
            stats.p50, p50_budget, stats.p95, p95_budget
        ))
    } else {
        None
    };

    BenchmarkResult {
        scenario: scenario.to_string(),
        stats: Some(stats),
        passed,
        reason,
    }
}

fn skipped(scenario: &str, program: &str) -> BenchmarkResult {
    BenchmarkResult {
        scenario: scenario.to_string(),
        stats: None,
        passed: true,
        reason: Some(format!("{} not installed", program)),
    }
}

fn main() {
    println!("=== aocgen Evaluation Latency Benchmark ===");
    println!("Iterations: {} (after {} warmup)", ITERATIONS, WARMUP_ITERATIONS);

    let dir = tempfile::tempdir().unwrap();
    let evaluator = Evaluator::default();

    let mut results = vec![benchmark(
        &evaluator,
        dir.path(),
        "Bash echo",
        "bash",
        "bench.sh",
        "echo 'The answer is: 42'\n",
        Duration::from_millis(50),
        Duration::from_millis(100),
    )];

    results.push(if available("python3") {
        // Interpreter startup dominates: p50 < 150ms, p95 < 300ms
        benchmark(
            &evaluator,
            dir.path(),
            "Python print",
            "python",
            "bench.py",
            "print('The answer is: 42')\n",
            Duration::from_millis(150),
            Duration::from_millis(300),
        )
    } else {
        skipped("Python print", "python3")
    });

    for result in &results {
        result.print();
    }

    let passed_count = results.iter().filter(|r| r.passed).count();
    let total_count = results.len();

    println!("\n=== Summary ===");
    println!("{}/{} scenarios passed", passed_count, total_count);

    if passed_count == total_count {
        println!("All latency budgets met");
        std::process::exit(0);
    } else {
        println!("Some latency budgets exceeded");
        std::process::exit(1);
    }
}
