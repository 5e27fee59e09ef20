//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Bookswap chat configuration
# Only override what you want to change -- missing fields use defaults.
# PORT and FRONTEND_URL environment variables override [server].

[server]
# host = "0.0.0.0"
# port = 5000
# allowed_origins = [
#   "http://localhost:5173",
#   "https://online-book-store-1-wth4.onrender.com",
#   "https://online-book-store-frontend.vercel.app",
# ]

[chat]
# enabled = true
# path = "/chat"
# history_capacity = 100    # 1-10000
# history_snapshot = 50     # 1-history_capacity
# outbound_buffer = 256     # 8-65536

[client]
# url = "ws://localhost:5000/chat"
# reconnect_delay_ms = 5000 # 100-600000
# connect_timeout_secs = 15 # 1-120
"##
    .to_string()
}
