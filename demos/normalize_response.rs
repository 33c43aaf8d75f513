use rpanos::ha;
use rpanos::xml::parse_response;
use std::env;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        "Usage: cargo run --example normalize_response -- <response.xml> [--ha] [--compact]"
    );
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(2);
    }

    let input = &args[1];
    let mut as_ha = false;
    let mut compact = false;
    for flag in args.iter().skip(2) {
        match flag.as_str() {
            "--ha" => as_ha = true,
            "--compact" => compact = true,
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            unknown => {
                eprintln!("Unknown flag: {unknown}");
                print_usage();
                process::exit(2);
            }
        }
    }

    let input_content = match fs::read_to_string(input) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read {input}: {err}");
            process::exit(1);
        }
    };

    let response = match parse_response(&input_content) {
        Ok(response) => response,
        Err(err) => {
            eprintln!("{}", err.to_value());
            process::exit(1);
        }
    };

    let rendered = if as_ha {
        let snapshot = ha::extract(&response);
        render(&snapshot, compact)
    } else {
        render(&response, compact)
    };

    match rendered {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("Failed to serialize: {err}");
            process::exit(1);
        }
    }
}

fn render<T: serde::Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}
