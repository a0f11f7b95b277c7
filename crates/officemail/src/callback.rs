//! Loopback listener that receives the authorization redirect.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use officemail_oauth::Error as OAuthError;
use officemail_oauth::callback::code_from_redirect;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use url::Url;

/// How long to wait for the browser to come back.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// How long in-flight responses get to finish once the code is in.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const SUCCESS_HTML: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>officemail</title></head>\
<body><h1>Authorization complete</h1><p>You can close this window.</p></body></html>";

const ERROR_HTML: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>officemail</title></head>\
<body><h1>Authorization failed</h1><p>Check the terminal for details.</p></body></html>";

#[derive(Clone)]
struct CallbackState {
    redirect_uri: Url,
    result_tx: mpsc::Sender<officemail_oauth::Result<String>>,
}

/// Binds the host and port of `redirect_uri`.
pub async fn bind(redirect_uri: &Url) -> Result<TcpListener> {
    let host = redirect_uri
        .host_str()
        .context("Redirect URI has no host")?;
    let port = redirect_uri
        .port_or_known_default()
        .context("Redirect URI has no port")?;
    let addr = format!("{host}:{port}");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot listen on {addr} (port may be in use)"))?;
    debug!("Listening for the redirect on {addr}");
    Ok(listener)
}

/// Serves `listener` until a redirect carrying `code` or `error` arrives,
/// then returns the code.
///
/// Other requests (a browser asking for `/favicon.ico`) get a 404 and the
/// wait continues. Connections are served concurrently, so an idle one
/// cannot hold up the redirect.
pub async fn wait_for_code(
    listener: TcpListener,
    redirect_uri: &Url,
    timeout: Duration,
) -> Result<String> {
    let (result_tx, mut result_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new().fallback(callback).with_state(CallbackState {
        redirect_uri: redirect_uri.clone(),
        result_tx,
    });

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let received = tokio::time::timeout(timeout, result_rx.recv()).await;

    let _ = shutdown_tx.send(());
    if tokio::time::timeout(SHUTDOWN_GRACE, server).await.is_err() {
        debug!("Callback server still draining connections, leaving it behind");
    }

    match received {
        Err(_) => Err(anyhow!("No redirect received within {}s", timeout.as_secs())),
        Ok(None) => Err(anyhow!("Callback server stopped before a redirect arrived")),
        Ok(Some(result)) => result.map_err(Into::into),
    }
}

async fn callback(State(state): State<CallbackState>, uri: Uri) -> Response {
    let Ok(url) = state.redirect_uri.join(&uri.to_string()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match code_from_redirect(&url) {
        Err(OAuthError::Authorization { ref error, .. }) if error == "missing_code" => {
            StatusCode::NOT_FOUND.into_response()
        }
        Ok(code) => {
            let _ = state.result_tx.try_send(Ok(code));
            Html(SUCCESS_HTML).into_response()
        }
        Err(e) => {
            warn!("Authorization redirect carried an error: {e}");
            let _ = state.result_tx.try_send(Err(e));
            (StatusCode::BAD_REQUEST, Html(ERROR_HTML)).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn request(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(
                format!("GET {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                    .as_bytes(),
            )
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn listen() -> (TcpListener, Url, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let redirect = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        (listener, redirect, port)
    }

    #[tokio::test]
    async fn test_receives_code() {
        let (listener, redirect, port) = listen().await;

        let client = tokio::spawn(async move {
            let favicon = request(port, "/favicon.ico").await;
            let callback = request(port, "/?code=abc&session_state=s").await;
            (favicon, callback)
        });

        let code = wait_for_code(listener, &redirect, Duration::from_secs(5))
            .await
            .unwrap();
        let (favicon, callback) = client.await.unwrap();

        assert_eq!(code, "abc");
        assert!(favicon.starts_with("HTTP/1.1 404"));
        assert!(callback.starts_with("HTTP/1.1 200"));
        assert!(callback.contains("Authorization complete"));
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_redirect() {
        let (listener, redirect, port) = listen().await;

        let client = tokio::spawn(async move {
            // Connects and never sends a request.
            let idle = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            let callback = request(port, "/?code=abc").await;
            drop(idle);
            callback
        });

        let code = wait_for_code(listener, &redirect, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(code, "abc");
        assert!(client.await.unwrap().starts_with("HTTP/1.1 200"));
    }

    #[tokio::test]
    async fn test_access_denied() {
        let (listener, redirect, port) = listen().await;

        let client = tokio::spawn(async move {
            request(port, "/?error=access_denied&error_description=declined").await
        });

        let err = wait_for_code(listener, &redirect, Duration::from_secs(5))
            .await
            .unwrap_err();
        let response = client.await.unwrap();

        assert!(matches!(
            err.downcast_ref::<OAuthError>(),
            Some(OAuthError::AccessDenied(_))
        ));
        assert!(response.starts_with("HTTP/1.1 400"));
    }

    #[tokio::test]
    async fn test_times_out() {
        let (listener, redirect, _) = listen().await;

        let err = wait_for_code(listener, &redirect, Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("No redirect received"));
    }

    #[tokio::test]
    async fn test_bind_redirect_host() {
        let redirect = Url::parse("http://127.0.0.1:0/").unwrap();
        assert!(bind(&redirect).await.is_ok());
    }
}
