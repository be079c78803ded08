//! k1s0-resource-cache: 接続先ごとのクライアントハンドルキャッシュ。
//!
//! 接続確立のコストが高いクライアント（DB・ブローカー・クラウド SDK など）を
//! キー単位で 1 つだけ生成し、同じキーを提示する全 Probe で共有する。
//! 有効期限・容量上限は持たない。壊れた接続を検知した Probe が明示的に
//! `invalidate` した場合のみエントリが入れ替わる。

pub mod cache;
pub mod client;
pub mod error;

pub use cache::ResourceCache;
pub use client::CachedClient;
pub use error::ResourceCacheError;
