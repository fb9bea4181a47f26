use clap::Parser;
use midilatch::{
    cli::{handle_device_list, Args},
    logging,
    midi::MidirBackend,
    monitor::{play_test_note, Monitor},
    Engine, EngineConfig,
};
use std::thread;

fn main() {
    let args = Args::parse();
    initialize_logging(&args);

    if args.device_list {
        list_available_devices(&handle_device_list());
        return;
    }

    let config = load_config(&args);
    let backend = MidirBackend::new(config.client_name.clone());

    let engine = match Engine::start(&config, backend) {
        Ok(engine) => engine,
        Err(e) => {
            let error_msg = format!("Error starting engine: {}", e);
            log::error!("{}", error_msg);
            eprintln!("{}", error_msg);
            std::process::exit(1);
        }
    };
    let handle = engine.handle();
    report_session(&handle);

    if args.test_note {
        let note_handle = handle.clone();
        let ticks = config.resolution;
        thread::spawn(move || play_test_note(&note_handle, ticks));
    }

    log::info!("Application running. Press Ctrl+C to exit...");
    println!("\nPress Ctrl+C to exit...");
    Monitor::new(handle, config.default_tempo).run()
}

fn initialize_logging(args: &Args) {
    let result = if args.log_stderr {
        logging::init_stderr_logger()
    } else {
        logging::init_logger(log::LevelFilter::Debug)
    };
    if let Err(e) = result {
        eprintln!("Logger initialization failed: {}", e);
        std::process::exit(1);
    }
    log::info!("Application starting");
}

fn load_config(args: &Args) -> EngineConfig {
    match EngineConfig::load(args.config.as_deref()).and_then(|c| args.apply(c).validate()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

fn report_session(handle: &midilatch::EngineHandle) {
    let info = handle.session_info();
    match &info.failure {
        Some(reason) => {
            eprintln!("MIDI unavailable ({}), continuing without ports", reason);
        }
        None => {
            println!(
                "MIDI session open: {} input(s), {} output(s)",
                info.inputs.len(),
                info.outputs.len()
            );
        }
    }
}
