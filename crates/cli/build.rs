use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("webharvest")
        .version("1.0.0")
        .author("Webharvest Contributors")
        .about("Archive a list of web articles as Markdown with local images")
        .arg(clap::arg!(<ARTICLES> "JSON file with {title, url} entries, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <DIR> "Output directory")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--config <FILE> "JSON config file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--preset <NAME> "Start from a site preset")
                .value_parser(clap::builder::PossibleValuesParser::new(webharvest_core::PRESET_NAMES.iter().copied())),
        )
        .arg(clap::arg!(--"base-url" <URL> "Base URL for resolving relative links and images").value_name("URL"))
        .arg(clap::arg!(--"content-selector" <SEL> "CSS selector for the main content element"))
        .arg(clap::arg!(--"title-selector" <SEL> "CSS selector used to derive missing titles"))
        .arg(clap::arg!(--skip <SEL> ... "Additional CSS selector to skip"))
        .arg(clap::arg!(--"skip-image" <KEYWORD> ... "Additional image source keyword to skip"))
        .arg(clap::arg!(--"no-images" "Keep remote image references instead of downloading"))
        .arg(clap::arg!(--"images-folder" <NAME> "Name of the per-article images folder"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds"))
        .arg(clap::arg!(--delay <SECS> "Pause between articles in seconds"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for page requests").value_name("UA"))
        .arg(clap::arg!(--encoding <LABEL> "Encoding for decoding pages and writing files"))
        .arg(clap::arg!(--"no-index" "Do not write README.md"))
        .arg(clap::arg!(--"no-failed-urls" "Do not write failed_urls.json"))
        .arg(clap::arg!(-q --quiet "Only print failures and the summary"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "webharvest", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "webharvest", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "webharvest", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "webharvest", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
