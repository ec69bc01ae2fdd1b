//! ExamSystem - 限时在线考试后端服务
//!
//! 基于 Actix Web 构建，负责考试会话的计时、作答保存、交卷与评分汇总。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证授权中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理与后台任务
//! - `scoring`: 自动评分后端（OpenAI 兼容接口）
//! - `services`: 业务逻辑层（会话生命周期、评分、成绩汇总）
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod scoring;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_support;
