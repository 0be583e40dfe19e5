use super::MachinePolicyKind;
use crate::core::types::JobId;
use rand::rngs::StdRng;
use rand::Rng;

/// A job waiting in a workstation input queue, with its total remaining
/// processing time precomputed by the workstation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedJob {
    pub job: JobId,
    pub remaining: f64,
}

/// Workstation to machine assignment strategy.
///
/// Called repeatedly while the workstation has both an idle machine and a
/// non-empty queue; each call picks one queue position.
pub trait MachineDispatch: Send + std::fmt::Debug {
    fn kind(&self) -> MachinePolicyKind;

    /// Index into `queue` of the job to assign next, `None` to stop
    fn select(&mut self, queue: &[QueuedJob], rng: &mut StdRng) -> Option<usize>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FifoDispatch;

impl MachineDispatch for FifoDispatch {
    fn kind(&self) -> MachinePolicyKind {
        MachinePolicyKind::Fifo
    }

    fn select(&mut self, queue: &[QueuedJob], _rng: &mut StdRng) -> Option<usize> {
        if queue.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDispatch;

impl MachineDispatch for RandomDispatch {
    fn kind(&self) -> MachinePolicyKind {
        MachinePolicyKind::Random
    }

    fn select(&mut self, queue: &[QueuedJob], rng: &mut StdRng) -> Option<usize> {
        if queue.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..queue.len()))
        }
    }
}

/// Longest total remaining processing time first, so long jobs are not
/// starved behind a stream of short ones. Ties go to the earlier arrival.
#[derive(Debug, Clone, Copy, Default)]
pub struct NehDispatch;

impl MachineDispatch for NehDispatch {
    fn kind(&self) -> MachinePolicyKind {
        MachinePolicyKind::Neh
    }

    fn select(&mut self, queue: &[QueuedJob], _rng: &mut StdRng) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, queued) in queue.iter().enumerate() {
            match best {
                Some(b) if queue[b].remaining >= queued.remaining => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

/// Order in which a policy would drain `queue` given unlimited idle machines
pub fn dispatch_order(
    policy: &mut dyn MachineDispatch,
    queue: &[QueuedJob],
    rng: &mut StdRng,
) -> Vec<JobId> {
    let mut remaining = queue.to_vec();
    let mut order = Vec::with_capacity(queue.len());
    while let Some(index) = policy.select(&remaining, rng) {
        order.push(remaining.remove(index).job);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn queue(times: &[f64]) -> Vec<QueuedJob> {
        times
            .iter()
            .enumerate()
            .map(|(job, &remaining)| QueuedJob { job, remaining })
            .collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let order = dispatch_order(&mut FifoDispatch, &queue(&[5.0, 50.0, 1.0]), &mut rng);
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_neh_order_is_non_increasing() {
        let mut rng = StdRng::seed_from_u64(0);
        let q = queue(&[50.0, 10.0, 30.0, 20.0]);
        let order = dispatch_order(&mut NehDispatch, &q, &mut rng);
        assert_eq!(order, vec![0, 2, 3, 1]);
        let times: Vec<f64> = order.iter().map(|j| q[*j].remaining).collect();
        assert_eq!(times, vec![50.0, 30.0, 20.0, 10.0]);
    }

    #[test]
    fn test_neh_ties_keep_arrival_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let order = dispatch_order(&mut NehDispatch, &queue(&[10.0, 30.0, 30.0]), &mut rng);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_random_visits_every_job_once() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut order = dispatch_order(&mut RandomDispatch, &queue(&[1.0; 6]), &mut rng);
        order.sort();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_queue_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(FifoDispatch.select(&[], &mut rng), None);
        assert_eq!(RandomDispatch.select(&[], &mut rng), None);
        assert_eq!(NehDispatch.select(&[], &mut rng), None);
    }
}
