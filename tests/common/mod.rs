#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file whose extension selects the
    /// manifest format. The file is removed when the handle drops.
    pub fn create_temp_manifest(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("waypoint_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_manifest(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_manifest(content, "json")
    }

    pub fn create_temp_toml(content: &str) -> NamedTempFile {
        create_temp_manifest(content, "toml")
    }
}

pub mod handlers {
    use waypoint::{Params, Request, Response};

    /// Handler answering 200 with a fixed text body.
    pub fn reply(
        body: &'static str,
    ) -> impl Fn(&mut Request, &Params) -> anyhow::Result<Response> + Send + Sync + 'static {
        move |_req, _params| Ok(Response::text(200, body))
    }

    /// Handler answering with its path parameters as `name=value` pairs.
    pub fn echo_params(_req: &mut Request, params: &Params) -> anyhow::Result<Response> {
        let pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Ok(Response::text(200, pairs.join("&")))
    }
}

pub mod tracing_util {
    use tracing::subscriber::DefaultGuard;

    /// Route `tracing` output to the test harness for the guard's lifetime.
    pub struct TestTracing {
        _guard: DefaultGuard,
    }

    impl TestTracing {
        pub fn init() -> Self {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_test_writer()
                .finish();
            Self {
                _guard: tracing::subscriber::set_default(subscriber),
            }
        }
    }
}
