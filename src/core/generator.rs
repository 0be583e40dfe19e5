use crate::core::components::job::Job;
use crate::core::errors::{SimError, SimResult};
use crate::core::execution::config::FactoryConfig;
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Gamma};

/// The pre-generated arrival schedule: every job the run will see, sorted by
/// arrival time, with job ids equal to their index
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalSchedule {
    jobs: Vec<Job>,
}

impl ArrivalSchedule {
    /// Build a schedule from hand-made jobs. Ids must equal positions and
    /// arrival times must be non-decreasing.
    pub fn from_jobs(jobs: Vec<Job>) -> SimResult<Self> {
        for (index, job) in jobs.iter().enumerate() {
            if job.id() != index {
                return Err(SimError::config(format!("job at position {} has id {}", index, job.id())));
            }
            if job.routing().len() != job.service_times().len() {
                return Err(SimError::config(format!(
                    "{} has {} routing steps but {} service times",
                    job.name(),
                    job.routing().len(),
                    job.service_times().len()
                )));
            }
        }
        if jobs.windows(2).any(|w| w[1].arrival_time() < w[0].arrival_time()) {
            return Err(SimError::config("arrival times must be non-decreasing"));
        }
        Ok(Self { jobs })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn arrival_times(&self) -> Vec<f64> {
        self.jobs.iter().map(|j| j.arrival_time()).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }
}

/// Samples arrival schedules from the configured job mix.
///
/// Inter-arrival times are exponential at the configured rate, job types are
/// drawn from the categorical mix, and each routing step gets a Gamma
/// service time with the type's mean and the shared shape.
#[derive(Debug, Clone)]
pub struct JobGenerator {
    interarrival: Exp<f64>,
    job_mix: WeightedIndex<f64>,
    routings: Vec<Vec<usize>>,
    service: Vec<Vec<Gamma<f64>>>,
    max_jobs: usize,
}

impl JobGenerator {
    pub fn new(config: &FactoryConfig) -> SimResult<Self> {
        let interarrival = Exp::new(config.arrival_rate)
            .map_err(|e| SimError::config(format!("arrival rate: {}", e)))?;
        let job_mix = WeightedIndex::new(config.job_types.iter().map(|t| t.probability))
            .map_err(|e| SimError::config(format!("job mix: {}", e)))?;

        let mut service = Vec::with_capacity(config.job_types.len());
        for job_type in &config.job_types {
            let mut steps = Vec::with_capacity(job_type.mean_service_times.len());
            for mean in &job_type.mean_service_times {
                let gamma = Gamma::new(config.gamma_shape, mean / config.gamma_shape)
                    .map_err(|e| SimError::config(format!("service time: {}", e)))?;
                steps.push(gamma);
            }
            service.push(steps);
        }

        Ok(Self {
            interarrival,
            job_mix,
            routings: config.job_types.iter().map(|t| t.routing.clone()).collect(),
            service,
            max_jobs: config.max_jobs,
        })
    }

    /// Draw a full schedule from a stream seeded with `seed`
    pub fn generate(&self, seed: u64) -> ArrivalSchedule {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate_with(&mut rng)
    }

    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> ArrivalSchedule {
        let mut jobs = Vec::with_capacity(self.max_jobs);
        let mut clock = 0.0;
        for id in 0..self.max_jobs {
            clock += self.interarrival.sample(rng);
            let job_type = self.job_mix.sample(rng);
            let service_times = self.service[job_type].iter().map(|g| g.sample(rng)).collect();
            jobs.push(Job::new(id, job_type, self.routings[job_type].clone(), service_times, clock));
        }
        ArrivalSchedule { jobs }
    }
}
