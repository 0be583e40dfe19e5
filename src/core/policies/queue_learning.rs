use crate::core::components::job::Job;
use crate::core::errors::{SimError, SimResult};
use crate::core::types::JobId;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters of the tabular queue reorder learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QLearningConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Exploration probability
    pub epsilon: f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
        }
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(SimError::config(format!("alpha must be in (0, 1], got {}", self.alpha)));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(SimError::config(format!("gamma must be in [0, 1], got {}", self.gamma)));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(SimError::config(format!("epsilon must be in [0, 1], got {}", self.epsilon)));
        }
        Ok(())
    }
}

/// Discretised view of a queue used as the Q-table state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueStateKey {
    pub len: usize,
    pub remaining_steps: Vec<usize>,
    /// Current-step service times, whole seconds
    pub service_times: Vec<u64>,
}

impl QueueStateKey {
    pub fn observe(queue: &[JobId], jobs: &[Job]) -> Self {
        let queued: Vec<&Job> = queue.iter().filter_map(|id| jobs.get(*id)).collect();
        Self {
            len: queue.len(),
            remaining_steps: queued.iter().map(|j| j.remaining_steps()).collect(),
            service_times: queued
                .iter()
                .map(|j| j.current_service_time().unwrap_or(0.0).round() as u64)
                .collect(),
        }
    }
}

/// A pairwise swap of two queue positions
pub type SwapAction = (usize, usize);

/// Tabular Q-learning agent that reorders one workstation's input queue.
///
/// Each step swaps two queue positions chosen epsilon-greedily. The reward is
/// the drop in the queue's cumulative completion time (current-step service
/// times served in queue order) caused by the swap.
#[derive(Debug, Clone)]
pub struct QueueLearner {
    config: QLearningConfig,
    q_table: HashMap<(QueueStateKey, SwapAction), f64>,
    steps: u64,
    total_reward: f64,
}

impl QueueLearner {
    pub fn new(config: QLearningConfig) -> Self {
        Self {
            config,
            q_table: HashMap::new(),
            steps: 0,
            total_reward: 0.0,
        }
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn q_value(&self, state: &QueueStateKey, action: SwapAction) -> f64 {
        self.q_table.get(&(state.clone(), action)).copied().unwrap_or(0.0)
    }

    pub fn table_size(&self) -> usize {
        self.q_table.len()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Apply one swap to `queue` and learn from it. Returns the reward, or
    /// `None` when the queue is too short to reorder.
    pub fn step(&mut self, queue: &mut [JobId], jobs: &[Job], rng: &mut StdRng) -> Option<f64> {
        if queue.len() < 2 {
            return None;
        }
        let actions = swap_actions(queue.len());
        let state = QueueStateKey::observe(queue, jobs);

        let action = if rng.gen::<f64>() < self.config.epsilon {
            actions[rng.gen_range(0..actions.len())]
        } else {
            self.best_action(&state, &actions)
        };

        let before = queue_cost(queue, jobs);
        queue.swap(action.0, action.1);
        let after = queue_cost(queue, jobs);
        let reward = before - after;

        let next_state = QueueStateKey::observe(queue, jobs);
        let next_best = actions
            .iter()
            .map(|a| self.q_value(&next_state, *a))
            .fold(f64::NEG_INFINITY, f64::max);
        let next_best = if next_best.is_finite() { next_best } else { 0.0 };

        let alpha = self.config.alpha;
        let gamma = self.config.gamma;
        let q = self.q_table.entry((state, action)).or_insert(0.0);
        *q += alpha * (reward + gamma * next_best - *q);

        self.steps += 1;
        self.total_reward += reward;
        Some(reward)
    }

    fn best_action(&self, state: &QueueStateKey, actions: &[SwapAction]) -> SwapAction {
        let mut best = actions[0];
        let mut best_value = self.q_value(state, best);
        for action in &actions[1..] {
            let value = self.q_value(state, *action);
            if value > best_value {
                best = *action;
                best_value = value;
            }
        }
        best
    }
}

fn swap_actions(len: usize) -> Vec<SwapAction> {
    (0..len)
        .flat_map(|i| (i + 1..len).map(move |j| (i, j)))
        .collect()
}

/// Sum of completion times when the queue is served one job at a time in order
pub fn queue_cost(queue: &[JobId], jobs: &[Job]) -> f64 {
    let mut elapsed = 0.0;
    let mut total = 0.0;
    for id in queue {
        if let Some(job) = jobs.get(*id) {
            elapsed += job.current_service_time().unwrap_or(0.0);
            total += elapsed;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn jobs(times: &[f64]) -> Vec<Job> {
        times
            .iter()
            .enumerate()
            .map(|(id, t)| Job::new(id, 0, vec![0], vec![*t], 0.0))
            .collect()
    }

    #[test]
    fn test_queue_cost() {
        let jobs = jobs(&[100.0, 10.0]);
        assert_eq!(queue_cost(&[0, 1], &jobs), 210.0);
        assert_eq!(queue_cost(&[1, 0], &jobs), 120.0);
    }

    #[test]
    fn test_swap_actions() {
        assert_eq!(swap_actions(3), vec![(0, 1), (0, 2), (1, 2)]);
        assert!(swap_actions(1).is_empty());
    }

    #[test]
    fn test_greedy_step_updates_table() {
        let jobs = jobs(&[100.0, 10.0]);
        let mut queue = vec![0, 1];
        let mut learner = QueueLearner::new(QLearningConfig {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.0,
        });
        let mut rng = StdRng::seed_from_u64(5);
        let state = QueueStateKey::observe(&queue, &jobs);

        let reward = learner.step(&mut queue, &jobs, &mut rng).unwrap();
        assert_eq!(reward, 90.0);
        assert_eq!(queue, vec![1, 0]);
        assert!((learner.q_value(&state, (0, 1)) - 9.0).abs() < 1e-9);
        assert_eq!(learner.steps(), 1);
    }

    #[test]
    fn test_short_queue_is_left_alone() {
        let jobs = jobs(&[1.0]);
        let mut queue = vec![0];
        let mut learner = QueueLearner::new(QLearningConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(learner.step(&mut queue, &jobs, &mut rng), None);
        assert_eq!(learner.table_size(), 0);
    }

    #[test]
    fn test_step_keeps_queue_contents() {
        let jobs = jobs(&[5.0, 40.0, 12.0, 30.0]);
        let mut queue = vec![0, 1, 2, 3];
        let mut learner = QueueLearner::new(QLearningConfig {
            epsilon: 1.0,
            ..QLearningConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            learner.step(&mut queue, &jobs, &mut rng);
        }
        let mut sorted = queue.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
        assert!(learner.table_size() > 0);
    }

    #[test]
    fn test_config_validation() {
        assert!(QLearningConfig::default().validate().is_ok());
        assert!(QLearningConfig { alpha: 0.0, ..QLearningConfig::default() }.validate().is_err());
        assert!(QLearningConfig { gamma: 1.5, ..QLearningConfig::default() }.validate().is_err());
        assert!(QLearningConfig { epsilon: -0.1, ..QLearningConfig::default() }.validate().is_err());
    }
}
