use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response};

/// Surf middleware that logs each request line and the status it settled with.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(&self, req: Request, client: Client, next: Next<'_>) -> surf::Result<Response> {
        let method = req.method();
        let url = req.url().to_string();
        log::debug!("--> {} {}", method, url);

        let start = Instant::now();
        match next.run(req, client).await {
            Ok(res) => {
                let status = res.status();
                if status.is_success() {
                    log::debug!("<-- {} {} {} ({:?})", status, method, url, start.elapsed());
                } else {
                    log::warn!("<-- {} {} {} ({:?})", status, method, url, start.elapsed());
                }
                Ok(res)
            }
            Err(err) => {
                log::warn!(
                    "<-- {} {} failed after {:?}: {}",
                    method,
                    url,
                    start.elapsed(),
                    err
                );
                Err(err)
            }
        }
    }
}
