//! Build script for the `vultr-csi` manual pages.
//!
//! Renders `vultr-csi.1` for the top-level command and one
//! `vultr-csi-<operation>.1` page per controller operation, all from the
//! clap definitions the binary parses. Pages land in `OUT_DIR`.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Command, CommandFactory};
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

const BINARY: &str = "vultr-csi";
const MANUAL: &str = "Vultr CSI Controller Manual";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR was not set")?);
    let command = Cli::command();

    for operation in command.get_subcommands() {
        let page = format!("{BINARY}-{}", operation.get_name());
        let titled = operation
            .clone()
            .display_name(&page)
            .bin_name(format!("{BINARY} {}", operation.get_name()));
        write_page(&out_dir, &page, titled)?;
    }
    write_page(&out_dir, BINARY, command)
}

fn write_page(out_dir: &Path, page: &str, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut rendered = Vec::new();
    Man::new(command)
        .manual(MANUAL)
        .source(format!("{BINARY} {}", env!("CARGO_PKG_VERSION")))
        .render(&mut rendered)?;
    fs::write(out_dir.join(format!("{page}.1")), rendered)?;
    Ok(())
}
