use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use tokio::net::TcpListener;

/// Stack-description endpoint with canned answers keyed by the `StackName` parameter:
///
/// - `pr-1`: one stack with a `FunctionUrl` output
/// - `pr-no-url`: one stack without outputs
/// - `pr-empty`: an empty `Stacks` list
/// - `pr-region`: one stack whose `Region` output echoes the `Region` parameter
/// - `pr-broken`: HTTP 500
/// - `pr-garbage`: HTTP 200 with a body that is not JSON
/// - anything else: HTTP 404
pub struct TestRegistryServer {
    pub url: url::Url,
}

impl TestRegistryServer {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);

                tokio::spawn(async move {
                    if let Err(err) =
                        hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                            .serve_connection(io, service_fn(describe_stacks))
                            .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        TestRegistryServer {
            url: url::Url::parse(&format!("http://127.0.0.1:{port}/stacks")).unwrap(),
        }
    }
}

async fn describe_stacks(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let params: Vec<(String, String)> = url::form_urlencoded::parse(
        req.uri().query().unwrap_or("").as_bytes(),
    )
    .into_owned()
    .collect();
    let param = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    let (status, body) = match param("StackName").as_str() {
        "pr-1" => (
            StatusCode::OK,
            serde_json::json!({
                "Stacks": [{
                    "StackName": "pr-1",
                    "Outputs": [
                        {"OutputKey": "BucketName", "OutputValue": "assets-pr-1"},
                        {"OutputKey": "FunctionUrl", "OutputValue": "https://abc.lambda-url.eu-west-1.on.aws/"}
                    ]
                }]
            })
            .to_string(),
        ),
        "pr-no-url" => (
            StatusCode::OK,
            serde_json::json!({"Stacks": [{"StackName": "pr-no-url"}]}).to_string(),
        ),
        "pr-empty" => (StatusCode::OK, r#"{"Stacks": []}"#.to_string()),
        "pr-region" => (
            StatusCode::OK,
            serde_json::json!({
                "Stacks": [{
                    "StackName": "pr-region",
                    "Outputs": [{"OutputKey": "Region", "OutputValue": param("Region")}]
                }]
            })
            .to_string(),
        ),
        "pr-broken" => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
        "pr-garbage" => (StatusCode::OK, "<html>".to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    Ok(response)
}
