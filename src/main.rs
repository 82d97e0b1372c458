//! `cubefield` viewer: load records from a JSON file (or demo records) and
//! fly through them.

use std::path::Path;

use cubefield::options::Options;
use cubefield::scene::record::{demo_records, load_records};
use cubefield::Viewer;

/// Record count generated when no file is given.
const DEMO_RECORDS: usize = 400;

fn main() {
    env_logger::init();

    let records = match std::env::args().nth(1) {
        Some(path) => match load_records(Path::new(&path)) {
            Ok(records) => records,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => {
            log::info!("no record file given; generating {DEMO_RECORDS} demo records");
            demo_records(DEMO_RECORDS)
        }
    };

    let options = match std::env::var("CUBEFIELD_OPTIONS") {
        Ok(path) => Options::load(Path::new(&path)).unwrap_or_else(|e| {
            log::warn!("{e}; using default options");
            Options::default()
        }),
        Err(_) => Options::default(),
    };

    if let Err(e) = Viewer::builder()
        .with_records(records)
        .with_options(options)
        .build()
        .run()
    {
        log::error!("{e}");
        std::process::exit(1);
    }
}
