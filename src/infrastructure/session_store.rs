//! 会话存储 - 基础设施层
//!
//! 进程内的 `session_id -> Session` 映射，生命周期与进程相同。
//! 每个 id 一把异步锁：同一候选人的请求串行执行，不同候选人并行。

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::Session;

type Slot = Arc<AsyncMutex<Option<Session>>>;

/// 会话存储
///
/// 职责：
/// - 保证同一 id 的读-改-写是原子的
/// - 会话为 `None` 的槽位在锁释放时被清理
/// - 不关心面试流程
#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<String, Slot>>,
    /// 存有会话的槽位数，在锁释放时更新
    live: AtomicUsize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取某个 id 的独占访问权
    ///
    /// 持有期间（包括跨越 `.await`）其他同 id 请求会排队等待
    pub async fn lock(&self, session_id: &str) -> SessionGuard<'_> {
        loop {
            let slot = {
                let mut slots = self.slots();
                Arc::clone(slots.entry(session_id.to_string()).or_default())
            };

            let guard = Arc::clone(&slot).lock_owned().await;

            // 等待期间槽位可能已被移除（会话结束），需要重新解析
            let still_current = self
                .slots()
                .get(session_id)
                .is_some_and(|current| Arc::ptr_eq(current, &slot));

            if still_current {
                return SessionGuard {
                    store: self,
                    session_id: session_id.to_string(),
                    slot,
                    was_live: guard.is_some(),
                    guard,
                };
            }
        }
    }

    /// 当前存活的会话数量
    ///
    /// 只统计已创建的会话，查询中的空槽位不计入
    pub fn session_count(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// 当前槽位数量（包括正在被查询的空槽位）
    pub fn slot_count(&self) -> usize {
        self.slots().len()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 某个 id 的独占访问凭证
///
/// 解引用为 `Option<Session>`；置为 `None` 即删除会话
pub struct SessionGuard<'a> {
    store: &'a SessionStore,
    session_id: String,
    slot: Slot,
    /// 加锁时是否已有会话
    was_live: bool,
    guard: OwnedMutexGuard<Option<Session>>,
}

impl Deref for SessionGuard<'_> {
    type Target = Option<Session>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        match (self.was_live, self.guard.is_some()) {
            (false, true) => {
                self.store.live.fetch_add(1, Ordering::AcqRel);
            }
            (true, false) => {
                self.store.live.fetch_sub(1, Ordering::AcqRel);
            }
            _ => {}
        }

        // 字段在 drop 之后才析构：先移除槽位再释放锁，排队者醒来后会发现槽位已失效
        if self.guard.is_none() {
            let mut slots = self.store.slots();
            if slots
                .get(&self.session_id)
                .is_some_and(|current| Arc::ptr_eq(current, &self.slot))
            {
                slots.remove(&self.session_id);
            }
        }
    }
}
