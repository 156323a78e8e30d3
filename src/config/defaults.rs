// Shared by the loader and the saver

/// `config.proxyProtocol`
pub const PROXY_PROTOCOL: bool = true;

/// `routes[].strategy`
pub const STRATEGY: &str = "sequential";

/// `routes[].cachePingTTL`
pub const CACHE_PING_TTL: &str = "3m";

/// `routes[].modifyVirtualHost`
pub const MODIFY_VIRTUAL_HOST: bool = false;

/// `routes[].fallback.motd`
pub const MOTD: &str = "";

/// `routes[].fallback.version.name`
pub const VERSION_NAME: &str = "";

/// `routes[].fallback.version.protocol`
pub const VERSION_PROTOCOL: i64 = -1;

/// `routes[].fallback.players.max`
pub const MAX_PLAYERS: i64 = 0;

/// `routes[].fallback.players.online`
pub const ONLINE_PLAYERS: i64 = 0;

/// Returns the value only when it is set and differs from `default`.
pub fn non_default<'a, T>(value: Option<&'a T>, default: &T) -> Option<&'a T>
where
    T: PartialEq + ?Sized,
{
    value.filter(|v| *v != default)
}
