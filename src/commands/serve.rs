use crate::args::ServeArgs;
use crate::commands::Out;
use crate::{server, Config, Result};

/// Runs the REST API until the process receives Ctrl-C. `args.port()` overrides the port in
/// `config.json`.
pub async fn serve(config: Config, args: ServeArgs) -> Result<Out<()>> {
    let port = args.port().unwrap_or_else(|| config.port());
    server::run(config, port).await?;
    Ok("Done running the server".into())
}
