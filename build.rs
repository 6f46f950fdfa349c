// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("debrepo")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Debrepo Contributors")
        .about("Catalog manager for Sileo/Cydia-style Debian package repositories")
        .subcommand_required(false)
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("DIR")
                .default_value(".")
                .global(true)
                .help("Repository root directory (holds debs/ and packageInfo/)"),
        )
        .arg(
            Arg::new("base_url")
                .long("base-url")
                .value_name("URL")
                .default_value("https://repo.example.com")
                .global(true)
                .help("Public base URL the repository is served from"),
        )
        .subcommand(
            Command::new("add")
                .about("Add a single package to the repository")
                .arg(
                    Arg::new("deb_path")
                        .help("Path to the .deb file (prompted for when omitted)"),
                ),
        )
        .subcommand(
            Command::new("bulk-add")
                .about("Add every .deb from a directory")
                .arg(
                    Arg::new("dir")
                        .help("Directory containing .deb files (prompted for when omitted)"),
                ),
        )
        .subcommand(Command::new("sync").about("Re-ingest one package from the repository inbox"))
        .subcommand(
            Command::new("sync-all").about("Re-ingest every package from the repository inbox"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("debrepo.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
