use bytes::BytesMut;
use ptmp_frame::{encode_frame, MessageType};
use ptmp_session::IpcCallInfo;

use crate::cmd::{parse_call_args, EncodeArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let call = IpcCallInfo::new(args.call_id, args.call_name.as_str())
        .with_args(parse_call_args(&args.args)?);
    let body = call
        .encode_body()
        .map_err(|err| session_error("encode failed", err))?;

    let mut wire = BytesMut::new();
    encode_frame(MessageType::IpcCall, &body, &mut wire);
    print_encoded(call.call_id, &call.call_name, &wire, format);
    Ok(SUCCESS)
}
