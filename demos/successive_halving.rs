use optimizer_sha::prelude::*;

fn main() {
    let sampler = SuccessiveHalvingSampler::builder(RandomSampler::new())
        .min_resource(5)
        .reduction_factor(3)
        .build()
        .unwrap();
    let study = Study::builder()
        .minimize()
        .name("successive-halving-demo")
        .sampler(sampler)
        .build()
        .unwrap();

    study
        .optimize(100, |trial| {
            let x = trial.suggest_float("x", -10.0, 10.0)?;
            let y = trial.suggest_int("y", -5, 5)?;
            let kernel = trial.suggest_categorical("kernel", &["linear", "rbf"])?;

            let penalty = if kernel == "rbf" { 0.0 } else { 1.0 };
            let loss = x * x + y as f64 + penalty;

            println!(
                "Trial {}: x={x:.4}, y={y}, kernel={kernel} -> loss={loss:.4}",
                trial.id()
            );
            Ok::<_, Error>(loss)
        })
        .unwrap();

    let best = study.best_trial().unwrap();
    println!("\nBest trial #{}: value={:.4}", best.number, best.value.unwrap_or(f64::NAN));
    for (name, value) in &best.params {
        println!("  {name}: {value}");
    }
}
