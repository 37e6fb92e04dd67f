/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認可ゲート (route_layer)
 * - cors / http: router 全体に掛ける横断的な層
 */
pub mod auth;
pub mod cors;
pub mod http;
