use std::path::PathBuf;
use trellis::{
    RequestContext, context,
    tiny_http::{Request, Response, ResponseBox},
};

pub fn handler(request: &mut Request, cx: &RequestContext<'_>) -> ResponseBox {
    cx.respond(
        &[PathBuf::from("api/greeting.html")],
        context! { method => request.method().as_str() },
    )
}

pub fn status(_request: &mut Request, _cx: &RequestContext<'_>) -> ResponseBox {
    Response::from_string("ok").boxed()
}
