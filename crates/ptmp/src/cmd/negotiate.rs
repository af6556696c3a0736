use ptmp_session::connect_with_config;
use tracing::warn;

use crate::cmd::NegotiateArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_negotiation, OutputFormat};

pub fn run(args: NegotiateArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connect.session_config()?;
    let mut session = connect_with_config(&args.connect.addr, &config)
        .map_err(|err| session_error("connect failed", err))?;

    let outcome = session
        .send_negotiation_request(&args.connect.negotiation())
        .and_then(|()| session.receive_negotiation_response())
        .map_err(|err| session_error("negotiation failed", err));

    if let Err(err) = session.disconnect("Finished") {
        warn!(error = %err, "disconnect failed");
    }

    print_negotiation(&outcome?, format);
    Ok(SUCCESS)
}
