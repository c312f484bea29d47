//! 可注入时钟与任务分叉/汇合
//!
//! 演奏中所有等待（按键保持、机械臂稳定）都通过 [`Clock`] 完成：
//!
//! - [`SystemClock`]：真实时间，使用 `spin_sleep` 获得亚毫秒精度
//! - [`SimClock`]：虚拟时间，只有当所有已登记任务都在睡眠时才推进，
//!   测试可以瞬间跑完整首曲子，同时保留相对时序和汇合语义
//!
//! 任务登记通过 `fork` / `park` / `exit` 三个钩子完成，[`fork_join`] 负责调用它们。

use parking_lot::{Condvar, Mutex};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 一组由同一父任务派生的子任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskGroup(u64);

impl TaskGroup {
    /// 不做任务记账的时钟返回的占位分组
    pub const UNTRACKED: TaskGroup = TaskGroup(0);
}

/// 时钟
///
/// 任务记账钩子默认为空操作，只有虚拟时钟需要它们。
pub trait Clock: Send + Sync {
    /// 自时钟创建以来经过的时间
    fn now(&self) -> Duration;

    /// 让当前任务睡眠
    fn sleep(&self, duration: Duration);

    /// 登记 `tasks` 个即将启动的子任务
    fn fork(&self, tasks: usize) -> TaskGroup {
        let _ = tasks;
        TaskGroup::UNTRACKED
    }

    /// 父任务开始等待 `group` 全部结束
    fn park(&self, group: TaskGroup) {
        let _ = group;
    }

    /// `group` 中的一个子任务结束
    fn exit(&self, group: TaskGroup) {
        let _ = group;
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }

    fn fork(&self, tasks: usize) -> TaskGroup {
        (**self).fork(tasks)
    }

    fn park(&self, group: TaskGroup) {
        (**self).park(group)
    }

    fn exit(&self, group: TaskGroup) {
        (**self).exit(group)
    }
}

// ============================================================================
// 真实时钟
// ============================================================================

/// 真实时钟
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            spin_sleep::sleep(duration);
        }
    }
}

// ============================================================================
// 虚拟时钟
// ============================================================================

#[derive(Debug)]
struct GroupState {
    remaining: usize,
    parent_parked: bool,
}

#[derive(Debug, Default)]
struct SimState {
    now: Duration,
    /// 正在运行（未睡眠、未等待子任务）的已登记任务数
    active: usize,
    next_id: u64,
    sleepers: BinaryHeap<Reverse<(Duration, u64)>>,
    released: HashSet<u64>,
    groups: HashMap<u64, GroupState>,
}

impl SimState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// 虚拟时钟
///
/// 规则：当已登记的运行任务数降到 0 时，时间跳到最早的唤醒时刻，
/// 并唤醒所有到期的睡眠者。父任务在最后一个子任务退出时被原子地重新计为运行，
/// 因此汇合点不会让时间提前推进。
///
/// 调用 `sleep` 的线程必须是已登记任务（由 [`fork_join`] 或 [`TaskGuard`] 登记）。
#[derive(Debug, Default)]
pub struct SimClock {
    state: Mutex<SimState>,
    wake: Condvar,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前正在睡眠的任务数
    pub fn sleeping(&self) -> usize {
        self.state.lock().sleepers.len()
    }

    fn advance(&self, state: &mut SimState) {
        if state.active > 0 {
            return;
        }
        let Some(&Reverse((earliest, _))) = state.sleepers.peek() else {
            return;
        };

        state.now = state.now.max(earliest);
        while let Some(&Reverse((at, id))) = state.sleepers.peek() {
            if at > state.now {
                break;
            }
            state.sleepers.pop();
            state.released.insert(id);
            state.active += 1;
        }
        self.wake.notify_all();
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock();
        let id = state.next_id();
        let at = state.now + duration;
        state.sleepers.push(Reverse((at, id)));
        state.active = state.active.saturating_sub(1);
        self.advance(&mut state);

        while !state.released.remove(&id) {
            self.wake.wait(&mut state);
        }
    }

    fn fork(&self, tasks: usize) -> TaskGroup {
        let mut state = self.state.lock();
        let id = state.next_id();
        if tasks > 0 {
            state.active += tasks;
            state.groups.insert(
                id,
                GroupState {
                    remaining: tasks,
                    parent_parked: false,
                },
            );
        }
        TaskGroup(id)
    }

    fn park(&self, group: TaskGroup) {
        let mut state = self.state.lock();
        if let Some(g) = state.groups.get_mut(&group.0) {
            g.parent_parked = true;
            state.active = state.active.saturating_sub(1);
            self.advance(&mut state);
        }
    }

    fn exit(&self, group: TaskGroup) {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);

        let mut finished = None;
        if let Some(g) = state.groups.get_mut(&group.0) {
            g.remaining = g.remaining.saturating_sub(1);
            if g.remaining == 0 {
                finished = Some(g.parent_parked);
            }
        }
        if let Some(parent_parked) = finished {
            state.groups.remove(&group.0);
            if parent_parked {
                state.active += 1;
            }
        }
        self.advance(&mut state);
    }
}

// ============================================================================
// 分叉 / 汇合
// ============================================================================

/// 已登记任务的守卫，析构时调用 [`Clock::exit`]
///
/// panic 展开时同样会注销，虚拟时钟不会因此卡死。
pub struct TaskGuard<'a> {
    clock: &'a dyn Clock,
    group: TaskGroup,
}

impl<'a> TaskGuard<'a> {
    /// 把当前线程登记为一个独立的根任务
    pub fn register(clock: &'a dyn Clock) -> Self {
        let group = clock.fork(1);
        Self { clock, group }
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.clock.exit(self.group);
    }
}

/// 为每个元素启动一个作用域线程，等待全部结束后按输入顺序返回结果
///
/// 子线程 panic 会在父线程重新抛出。
pub fn fork_join<T, R, F>(clock: &dyn Clock, items: Vec<T>, task: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let group = clock.fork(items.len());
    std::thread::scope(|scope| {
        let task = &task;
        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                scope.spawn(move || {
                    let _guard = TaskGuard { clock, group };
                    task(item)
                })
            })
            .collect();

        clock.park(group);

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_clock_starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_sim_clock_single_task_sleep() {
        let clock = SimClock::new();
        let _task = TaskGuard::register(&clock);
        clock.sleep(Duration::from_millis(150));
        assert_eq!(clock.now(), Duration::from_millis(150));
        clock.sleep(Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_millis(150));
    }

    #[test]
    fn test_sim_clock_parallel_sleeps_overlap() {
        let clock = SimClock::new();
        let _task = TaskGuard::register(&clock);

        let woke = fork_join(&clock, vec![300u64, 100, 200], |ms| {
            clock.sleep(Duration::from_millis(ms));
            clock.now()
        });

        assert_eq!(
            woke,
            vec![
                Duration::from_millis(300),
                Duration::from_millis(100),
                Duration::from_millis(200)
            ]
        );
        // 汇合点在最晚的子任务结束时
        assert_eq!(clock.now(), Duration::from_millis(300));
    }

    #[test]
    fn test_sim_clock_nested_groups() {
        let clock = SimClock::new();
        let _task = TaskGuard::register(&clock);

        let ends = fork_join(&clock, vec![vec![50u64, 10], vec![]], |holds| {
            fork_join(&clock, holds, |ms| clock.sleep(Duration::from_millis(ms)));
            clock.sleep(Duration::from_millis(150));
            clock.now()
        });

        assert_eq!(
            ends,
            vec![Duration::from_millis(200), Duration::from_millis(150)]
        );
        assert_eq!(clock.now(), Duration::from_millis(200));
    }

    #[test]
    fn test_fork_join_empty() {
        let clock = SystemClock::new();
        let out: Vec<u8> = fork_join(&clock, Vec::<u8>::new(), |x| x);
        assert!(out.is_empty());
    }

    #[test]
    fn test_system_clock_sleeps() {
        let clock = SystemClock::new();
        let before = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now() - before >= Duration::from_millis(5));
    }

    #[test]
    fn test_fork_join_propagates_panic() {
        let clock = SimClock::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _task = TaskGuard::register(&clock);
            fork_join(&clock, vec![1, 2], |x| {
                if x == 2 {
                    panic!("boom");
                }
                x
            })
        }));
        assert!(result.is_err());
        assert_eq!(clock.sleeping(), 0);
    }
}
