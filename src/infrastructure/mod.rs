pub mod dashscope;

pub use dashscope::DashScopeClient;
