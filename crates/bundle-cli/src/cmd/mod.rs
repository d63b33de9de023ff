use anyhow::Result;

use crate::args::{Cli, Command};

mod add;
mod create;
mod delta;
mod diff;
mod doctor;
mod export;
mod import;
mod sign;
mod verify;

pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Create { name, version, bundle_type, out } => {
            create::run(&name, &version, &bundle_type, &out).await
        }
        Command::Add { bundle, file, content_type, id } => add::run(&bundle, &file, &content_type, &id).await,
        Command::Sign { bundle, key } => sign::run(&bundle, &key).await,
        Command::Verify { bundle, pubkey } => verify::run(&bundle, &pubkey).await,
        Command::Export { bundle, out, compression, encrypt } => {
            export::run(&bundle, &out, compression.as_deref(), encrypt.as_deref()).await
        }
        Command::Import { archive, target, pubkey, backup, force, validation_level, encrypted } => {
            import::run(&archive, &target, &pubkey, backup.as_deref(), force, &validation_level, encrypted).await
        }
        Command::Delta { from, to, out } => delta::run(&from, &to, &out).await,
        Command::Diff { local, remote, format } => diff::run(&local, &remote, &format).await,
        Command::Doctor { store_root } => doctor::run(store_root.as_deref()).await,
    }
}
