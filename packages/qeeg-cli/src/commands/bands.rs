use crate::cli::{AnalysisOptions, BandsArgs};
use crate::exit_codes;
use crate::output;
use crate::params;
use qeeg_rs::FrequencyBand;

pub fn execute(args: BandsArgs) -> i32 {
    let options = AnalysisOptions {
        config: args.config.clone(),
        ..Default::default()
    };
    let config = match params::build_config(&options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        if !output::emit(&config.bands, false, None) {
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!("Frequency Bands:\n");
        println!("  {:<12} {:>8} {:>8}", "Band", "Low Hz", "High Hz");
        println!("  {}", "-".repeat(30));
        for FrequencyBand { name, low_hz, high_hz } in &config.bands {
            println!("  {:<12} {:>8.1} {:>8.1}", name, low_hz, high_hz);
        }
        println!();
        println!(
            "Relative power is normalized by {:.1}-{:.1} Hz broadband power.",
            config.broadband_low_hz, config.broadband_high_hz
        );
    }

    exit_codes::SUCCESS
}
