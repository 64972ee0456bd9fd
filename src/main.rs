use ed300_bridge::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::new();

    let config = match Config::new(options.config_file.clone()) {
        Ok(config) => config,
        Err(err) => {
            ed300_bridge::init_logging("info");
            error!("failed to load config {}: {:?}", options.config_file, err);
            std::process::exit(255);
        }
    };

    ed300_bridge::init_logging(&config.loglevel());
    info!("using config file: {}", options.config_file);

    ed300_bridge::run(config).await
}
