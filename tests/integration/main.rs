//! Integration tests for buildcache

mod server;

mod http_wire_tests {
    use super::server::{Reply, StubServer};
    use buildcache::cache::{HttpBuildCache, ResilientBuildCache};
    use buildcache::cache::http::parse_root;
    use buildcache::diagnostics::{RecordingSink, SharedSink};
    use buildcache::{BuildCache, CacheKey};
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::Level;

    fn sink() -> SharedSink {
        Arc::new(RecordingSink::new(Level::DEBUG))
    }

    fn backend(server: &StubServer) -> HttpBuildCache {
        HttpBuildCache::new(
            parse_root(&server.root()).unwrap(),
            Some(Duration::from_secs(10)),
            sink(),
        )
        .unwrap()
    }

    fn by_key(_method: &str, path: &str) -> Reply {
        match path.rsplit('/').next() {
            Some("hit") => Reply::new(200, "OK", b"ABC"),
            Some("broken") => Reply::new(500, "Internal Server Error", b"oops"),
            _ => Reply::new(404, "Not Found", b""),
        }
    }

    #[test]
    fn get_200_delivers_body() {
        let server = StubServer::start(by_key);
        let cache = backend(&server);

        let mut out = Vec::new();
        assert!(cache.load(&CacheKey::new("hit"), &mut out).unwrap());
        assert_eq!(out, b"ABC");

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/cache/hit");
        cache.close().unwrap();
    }

    #[test]
    fn get_404_is_a_miss() {
        let server = StubServer::start(by_key);
        let cache = backend(&server);
        let mut out = Vec::new();
        assert!(!cache.load(&CacheKey::new("absent"), &mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn get_500_is_an_error() {
        let server = StubServer::start(by_key);
        let cache = backend(&server);
        let err = cache
            .load(&CacheKey::new("broken"), &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn put_streams_chunked_body() {
        let server = StubServer::start(|_, _| Reply::new(201, "Created", b""));
        let cache = backend(&server);
        let entry: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();

        cache.store(&CacheKey::new("0a1b2c"), &entry).unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/cache/0a1b2c");
        assert!(!requests[0].headers.contains_key("content-length"));
        assert_eq!(requests[0].body, entry);
    }

    #[test]
    fn put_error_status_is_not_an_error() {
        let server = StubServer::start(|_, _| Reply::new(413, "Payload Too Large", b""));
        let cache = backend(&server);
        cache
            .store(&CacheKey::new("big"), &b"entry".to_vec())
            .unwrap();
    }

    #[test]
    fn unreachable_service_disables_wrapped_cache() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let root = parse_root(&format!("http://127.0.0.1:{}/cache/", port)).unwrap();
        let recording = Arc::new(RecordingSink::new(Level::WARN));
        let http = HttpBuildCache::new(root, Some(Duration::from_secs(5)), recording.clone()).unwrap();
        let cache = ResilientBuildCache::new(http, 2, recording.clone());

        let key = CacheKey::new("abc");
        assert!(!cache.load(&key, &mut Vec::new()).unwrap());
        cache.store(&key, &b"x".to_vec()).unwrap();
        assert!(!cache.is_enabled());
        assert!(!cache.load(&key, &mut Vec::new()).unwrap());

        cache.close().unwrap();
        assert_eq!(recording.count(Level::WARN, "is now disabled"), 1);
        assert_eq!(recording.count(Level::WARN, "was disabled during the build"), 1);
    }
}

mod cli_tests {
    use super::server::{Reply, StubServer};
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the user's configuration
    fn buildcache(config_dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("buildcache");
        cmd.env_remove("BUILDCACHE_HTTP_ROOT")
            .arg("--config")
            .arg(config_dir.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build-artifact cache client"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("buildcache"));
    }

    #[test]
    fn info_shows_default_memory_cache() {
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .args(["info", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"backend\": \"memory\""))
            .stdout(predicate::str::contains("\"max_error_count\": 3"));
    }

    #[test]
    fn config_init_then_show() {
        let temp = TempDir::new().unwrap();
        buildcache(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").exists());

        buildcache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache.resilience]"));
    }

    #[test]
    fn config_path_prints_override() {
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn root_without_trailing_slash_fails_fast() {
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .args(["get", "abc", "--http-root", "http://127.0.0.1:9/cache"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("must end with '/'"));
    }

    #[test]
    fn get_prints_entry_to_stdout() {
        let server = StubServer::start(|_, _| Reply::new(200, "OK", b"ABC"));
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .args(["get", "abc123", "--http-root", server.root().as_str()])
            .assert()
            .success()
            .stdout("ABC");
    }

    #[test]
    fn get_writes_entry_to_file() {
        let server = StubServer::start(|_, _| Reply::new(200, "OK", b"ABC"));
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("entry.bin");
        buildcache(&temp)
            .args(["get", "abc123", "--http-root", server.root().as_str(), "-o"])
            .arg(&output)
            .assert()
            .success();
        assert_eq!(std::fs::read(&output).unwrap(), b"ABC");
    }

    #[test]
    fn get_miss_fails_without_creating_file() {
        let server = StubServer::start(|_, _| Reply::new(404, "Not Found", b""));
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("entry.bin");
        buildcache(&temp)
            .args(["get", "abc123", "--http-root", server.root().as_str(), "-o"])
            .arg(&output)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache entry not found"));
        assert!(!output.exists());
    }

    #[test]
    fn server_error_is_absorbed_by_circuit_breaker() {
        let server = StubServer::start(|_, _| Reply::new(500, "Internal Server Error", b""));
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .args(["get", "abc123", "--http-root", server.root().as_str()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache entry not found"));
    }

    #[test]
    fn server_error_surfaces_without_circuit_breaker() {
        let server = StubServer::start(|_, _| Reply::new(500, "Internal Server Error", b""));
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[cache.resilience]\nenabled = false\n",
        )
        .unwrap();

        buildcache(&temp)
            .args(["get", "abc123", "--http-root", server.root().as_str()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("500"));
    }

    #[test]
    fn put_uploads_file_under_content_key() {
        let server = StubServer::start(|_, _| Reply::new(200, "OK", b""));
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("artifact.txt");
        std::fs::write(&file, b"hello").unwrap();

        buildcache(&temp)
            .args(["put", "--http-root", server.root().as_str()])
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
            ));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].path,
            "/cache/2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(requests[0].body, b"hello");
    }

    #[test]
    fn put_into_memory_cache_warns_entry_is_discarded() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("artifact.txt");
        std::fs::write(&file, b"hello").unwrap();

        buildcache(&temp)
            .arg("put")
            .arg(&file)
            .assert()
            .success()
            .stderr(predicate::str::contains("in-memory cache is discarded"));
    }

    #[test]
    fn put_to_http_cache_does_not_warn() {
        let server = StubServer::start(|_, _| Reply::new(200, "OK", b""));
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("artifact.txt");
        std::fs::write(&file, b"hello").unwrap();

        buildcache(&temp)
            .args(["put", "--http-root", server.root().as_str()])
            .arg(&file)
            .assert()
            .success()
            .stderr(predicate::str::contains("discarded").not());
    }

    #[test]
    fn put_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        buildcache(&temp)
            .args(["put", "does-not-exist.bin"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not a file"));
    }
}
