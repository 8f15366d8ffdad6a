use std::net::SocketAddr;
use std::time::Duration;

use pico_args::Arguments;
use tracing::warn;

pub const HELP: &str = "\
Run a landlord card game server

USAGE:
  landlord_server [OPTIONS] [SEAT_COUNT]

ARGS:
  SEAT_COUNT               Players needed to start a game  [default: 3]

OPTIONS:
  --tcp        IP:PORT     Line protocol bind address      [default: env LANDLORD_TCP_BIND or 0.0.0.0:8888]
  --ws         IP:PORT     WebSocket bind address          [default: env LANDLORD_WS_BIND or 0.0.0.0:25917]
  --idle-secs  N           Close sessions idle this long   [default: 300]
  --pace-ms    N           Pause before dealing and after a game ends  [default: 1000]
  --seed       N           Seed for shuffling and landlord draws  [default: OS entropy]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  RUST_LOG                 Log filter  [default: info]
";

pub const DEFAULT_SEATS: usize = 3;
const MIN_SEATS: usize = 2;
const MAX_SEATS: usize = 17;

/// 启动后不再改变的服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub seat_count: usize,
    pub tcp_bind: SocketAddr,
    pub ws_bind: SocketAddr,
    pub idle_timeout: Duration,
    pub pace: Duration,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            seat_count: DEFAULT_SEATS,
            tcp_bind: SocketAddr::from(([0, 0, 0, 0], 8888)),
            ws_bind: SocketAddr::from(([0, 0, 0, 0], 25917)),
            idle_timeout: Duration::from_secs(300),
            pace: Duration::from_millis(1000),
            seed: None,
        }
    }
}

impl ServerConfig {
    /// 解析命令行。选项必须在位置参数之前取出。
    pub fn from_args(mut pargs: Arguments) -> Result<ServerConfig, pico_args::Error> {
        let defaults = ServerConfig::default();

        let tcp_bind = match pargs.opt_value_from_str("--tcp")? {
            Some(addr) => addr,
            None => bind_from_env("LANDLORD_TCP_BIND", defaults.tcp_bind),
        };
        let ws_bind = match pargs.opt_value_from_str("--ws")? {
            Some(addr) => addr,
            None => bind_from_env("LANDLORD_WS_BIND", defaults.ws_bind),
        };
        let idle_timeout = pargs
            .opt_value_from_str("--idle-secs")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.idle_timeout);
        let pace = pargs
            .opt_value_from_str("--pace-ms")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.pace);
        let seed = pargs.opt_value_from_str("--seed")?;

        let seat_count = parse_seat_count(pargs.opt_free_from_str::<String>()?.as_deref());

        let rest = pargs.finish();
        if !rest.is_empty() {
            warn!("ignoring unused arguments: {:?}", rest);
        }

        Ok(ServerConfig { seat_count, tcp_bind, ws_bind, idle_timeout, pace, seed })
    }
}

fn bind_from_env(key: &str, default: SocketAddr) -> SocketAddr {
    match std::env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid address: {}, using {}", key, value, default);
            default
        }),
        Err(_) => default,
    }
}

/// 人数缺省、解析不了或超出 2..=17 时都用 3
fn parse_seat_count(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_SEATS;
    };
    match raw.parse::<usize>() {
        Ok(n) if (MIN_SEATS..=MAX_SEATS).contains(&n) => n,
        _ => {
            warn!("invalid seat count {:?}, using {}", raw, DEFAULT_SEATS);
            DEFAULT_SEATS
        }
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(|s| OsString::from(*s)).collect())
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_args(args(&[])).unwrap();
        assert_eq!(config.seat_count, 3);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_options_and_seat_count() {
        let config = ServerConfig::from_args(args(&[
            "--tcp", "127.0.0.1:9000", "--seed", "42", "--idle-secs", "5", "--pace-ms", "0", "4",
        ]))
        .unwrap();
        assert_eq!(config.seat_count, 4);
        assert_eq!(config.tcp_bind, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.pace, Duration::ZERO);
    }

    #[test]
    fn test_bad_seat_count_falls_back() {
        assert_eq!(parse_seat_count(Some("abc")), 3);
        assert_eq!(parse_seat_count(Some("1")), 3);
        assert_eq!(parse_seat_count(Some("18")), 3);
        assert_eq!(parse_seat_count(Some("17")), 17);
        assert_eq!(parse_seat_count(None), 3);
    }

    #[test]
    fn test_bad_option_value_is_an_error() {
        assert!(ServerConfig::from_args(args(&["--seed", "many"])).is_err());
    }
}
