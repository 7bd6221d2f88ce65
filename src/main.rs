use clap::Parser;
use mapproxy_gen::utils::logger::{init_logger, LogFormat};
use mapproxy_gen::utils::validation::Validate;
use mapproxy_gen::{CliArgs, GeneratorError, HttpCapabilitySource, LocalStorage, MapproxyGenerator};

fn report_failure(e: &GeneratorError) -> ! {
    tracing::error!("❌ Generation failed: {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    init_logger(LogFormat::from_json_flag(args.json_logs), args.verbose);

    tracing::debug!("CLI args: {:?}", args);

    let config = args.generator_config();
    if let Err(e) = config.validate() {
        report_failure(&e);
    }

    let source = match HttpCapabilitySource::new(config.timeout) {
        Ok(source) => source,
        Err(e) => report_failure(&e),
    };
    let generator = MapproxyGenerator::new(source, LocalStorage::default(), config);

    if args.dry_run {
        tracing::info!("🔍 Dry run, printing configuration instead of writing it");
        match generator.render().await {
            Ok(yaml) => print!("{}", yaml),
            Err(e) => report_failure(&e),
        }
        return;
    }

    match generator.run().await {
        Ok(output_path) => {
            tracing::info!("✅ MapProxy configuration written to: {}", output_path);
        }
        Err(e) => report_failure(&e),
    }
}
