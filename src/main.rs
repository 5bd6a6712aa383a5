#![allow(unused_imports)]
#![allow(dead_code)]

#[macro_use]
extern crate log;

mod guid;
mod products;
mod property;
mod query;
mod version;
#[cfg(windows)]
mod winapi;

use clap::{Arg, ArgAction, Command};

use crate::guid::Guid;

fn main() {
    env_logger::init();

    let matches = Command::new("msifind")
        .version("0.1.0")
        .about("find installed products and versions for an upgrade code")
        .arg(
            Arg::new("upgrade_code")
                .required(true)
                .help("upgrade code, braced or plain GUID"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("emit results as a JSON array"),
        )
        .get_matches();

    let raw = matches.get_one::<String>("upgrade_code").unwrap();
    let upgrade: Guid = match raw.parse() {
        Ok(guid) => guid,
        Err(err) => {
            eprintln!("invalid upgrade code {:?}: {}", raw, err);
            std::process::exit(2);
        }
    };

    run(&upgrade, matches.get_flag("json"));
}

#[cfg(windows)]
fn run(upgrade: &Guid, json: bool) {
    use crate::products::{resolve_version, ProductRecord, RelatedProducts};
    use crate::query::QueryOutcome;
    use crate::winapi::msi::MsiInstaller;
    use crate::winapi::registry::SystemConfigStore;

    let installer = MsiInstaller;
    let store = SystemConfigStore;

    let mut products = RelatedProducts::new(&installer, *upgrade);
    let codes: Vec<Guid> = products.by_ref().collect();
    if let Some((code, message)) = products.failure() {
        error!("enumeration failed with {}: {}", code, message);
    }
    info!("found {} related product(s)", codes.len());

    let mut records = Vec::with_capacity(codes.len());
    for product in &codes {
        let version = match resolve_version(&installer, &store, product) {
            QueryOutcome::Found(version) => Some(version),
            QueryOutcome::NotFound => {
                info!("no version found for {}", product);
                None
            }
            QueryOutcome::Error { message, .. } => {
                error!("version lookup for {} failed: {}", product, message);
                None
            }
        };
        records.push(ProductRecord {
            product_code: product.to_string(),
            version: version.map(|v| v.to_string()),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records).unwrap());
        return;
    }
    for record in &records {
        if let Some(version) = &record.version {
            println!("{}: {}", record.product_code, version);
        }
    }
}

#[cfg(not(windows))]
fn run(_upgrade: &Guid, _json: bool) {
    eprintln!("msifind queries the Windows Installer and only runs on Windows");
    std::process::exit(1);
}
