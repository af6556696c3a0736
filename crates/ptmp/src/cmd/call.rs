use ptmp_session::{connect_with_config, AuthenticationResponse, IpcCallInfo};
use tracing::{debug, warn};

use crate::cmd::{parse_call_args, CallArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_call_response, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connect.session_config()?;
    let call = IpcCallInfo::new(args.call_id, args.call_name.as_str())
        .with_args(parse_call_args(&args.args)?);

    let mut session = connect_with_config(&args.connect.addr, &config)
        .map_err(|err| session_error("connect failed", err))?;

    let negotiation = args.connect.negotiation();
    let username = args.username.clone();
    let digest = args.digest.clone();
    let outcome = session
        .handshake(&negotiation, &args.username, |challenge| {
            debug!(challenge = %challenge.challenge, "answering challenge with configured digest");
            AuthenticationResponse::new(username, digest, "")
        })
        .map_err(|err| session_error("handshake failed", err))
        .and_then(|server| {
            session
                .call(&call)
                .map(|response| (server, response))
                .map_err(|err| session_error("call failed", err))
        });

    if let Err(err) = session.disconnect("Finished") {
        warn!(error = %err, "disconnect failed");
    }

    let (server, response) = outcome?;
    print_call_response(&call.call_name, &server, &response, format);
    Ok(SUCCESS)
}
