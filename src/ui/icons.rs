pub struct Icons;

impl Icons {
    pub const MESH: &str = "🕸️";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const DEVICE: &str = "💡";
    pub const GROUP: &str = "📦";
    pub const KEY: &str = "🔑";
    pub const DEL: &str = "🗑️";
    pub const EMPTY: &str = "∅";
}
