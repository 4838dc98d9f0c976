use {
    crate::error::{
        Result,
        Td3Error,
    },
    candle_core::Tensor,
    rand::thread_rng,
    std::collections::VecDeque,
    unzip_n::unzip_n,
};

unzip_n!(5);

/// A transition in the replay buffer.
///
/// Immutable once stored, and owned by the buffer until it gets evicted.
///
/// # Fields
///
/// * `state` - The state tensor.
/// * `action` - The action tensor.
/// * `reward` - The reward tensor.
/// * `next_state` - The next state tensor.
/// * `done` - The done flag as a 0/1 tensor.
#[derive(Clone)]
pub struct Transition {
    state: Tensor,
    action: Tensor,
    reward: Tensor,
    next_state: Tensor,
    done: Tensor,
}
impl Transition {
    fn new(
        state: &Tensor,
        action: &Tensor,
        reward: &Tensor,
        next_state: &Tensor,
        done: &Tensor,
    ) -> Self {
        Self {
            state: state.clone(),
            action: action.clone(),
            reward: reward.clone(),
            next_state: next_state.clone(),
            done: done.clone(),
        }
    }
}

/// A replay buffer for off-policy algorithms.
///
/// The replay buffer is implemented as a simple ring buffer / VecDeque:
/// once at capacity, pushing evicts the oldest transition first.
///
/// # Fields
///
/// * `buffer` - The buffer of transitions.
/// * `capacity` - The capacity of the buffer.
/// * `size` - The current size of the buffer.
#[derive(Clone)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
    size: usize,
}
impl ReplayBuffer {
    /// Create a new replay buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            size: 0,
        }
    }

    /// The number of transitions currently stored.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Check if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.size == self.capacity
    }

    /// Push a transition into the buffer.
    ///
    /// If the buffer is full, the oldest transition is removed to make room
    /// for the new transition.
    pub fn push(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: &Tensor,
        next_state: &Tensor,
        done: &Tensor,
    ) {
        if self.size == self.capacity {
            // a zero-capacity buffer has nothing to evict and stores nothing
            if self.buffer.pop_front().is_none() {
                return;
            }
        } else {
            self.size += 1;
        }
        self.buffer.push_back(Transition::new(
            state, action, reward, next_state, done,
        ));
    }

    /// Sample a random batch of distinct transitions from the buffer.
    ///
    /// The draw is uniform and without replacement within the batch, and it
    /// leaves the stored transitions untouched. Fails with
    /// [`Td3Error::InsufficientData`] unless strictly more than `batch_size`
    /// transitions are stored.
    ///
    /// Returns five parallel batched tensors (states, actions, rewards,
    /// next states, done flags) preserving the sampled-index correspondence
    /// across all of them.
    #[allow(clippy::type_complexity)]
    pub fn random_batch(
        &self,
        batch_size: usize,
    ) -> Result<(Tensor, Tensor, Tensor, Tensor, Tensor)> {
        if self.size <= batch_size {
            return Err(Td3Error::InsufficientData {
                requested: batch_size,
                available: self.size,
            });
        }

        let transition_to_tuple =
            |t: &Transition| -> Result<(Tensor, Tensor, Tensor, Tensor, Tensor)> {
                Ok((
                    t.state.unsqueeze(0)?,
                    t.action.unsqueeze(0)?,
                    t.reward.unsqueeze(0)?,
                    t.next_state.unsqueeze(0)?,
                    t.done.unsqueeze(0)?,
                ))
            };

        let transitions: Vec<&Transition> =
            rand::seq::index::sample(&mut thread_rng(), self.size, batch_size)
                .iter()
                .map(|i| self.buffer.get(i).unwrap())
                .collect();

        let (states, actions, rewards, next_states, dones) = transitions
            .into_iter()
            .map(transition_to_tuple)
            .collect::<Result<Vec<(Tensor, Tensor, Tensor, Tensor, Tensor)>>>()?
            .into_iter()
            .unzip_n_vec();

        Ok((
            Tensor::cat(&states, 0)?,
            Tensor::cat(&actions, 0)?,
            Tensor::cat(&rewards, 0)?,
            Tensor::cat(&next_states, 0)?,
            Tensor::cat(&dones, 0)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        candle_core::{DType, Device},
    };

    fn transition_parts(id: f64, device: &Device) -> (Tensor, Tensor, Tensor, Tensor, Tensor) {
        (
            Tensor::new(vec![id, id], device).unwrap(),
            Tensor::new(vec![id], device).unwrap(),
            Tensor::new(vec![id], device).unwrap(),
            Tensor::new(vec![id + 0.5, id + 0.5], device).unwrap(),
            Tensor::zeros(1, DType::F64, device).unwrap(),
        )
    }

    fn fill(buffer: &mut ReplayBuffer, ids: impl Iterator<Item = usize>, device: &Device) {
        for id in ids {
            let (s, a, r, ns, d) = transition_parts(id as f64, device);
            buffer.push(&s, &a, &r, &ns, &d);
        }
    }

    fn stored_rewards(buffer: &ReplayBuffer) -> Vec<f64> {
        buffer
            .buffer
            .iter()
            .map(|t| t.reward.to_vec1::<f64>().unwrap()[0])
            .collect()
    }

    #[test]
    fn fifo_eviction_keeps_the_newest_transitions() {
        let device = Device::Cpu;
        let mut buffer = ReplayBuffer::new(5);

        fill(&mut buffer, 1..=7, &device);

        assert_eq!(buffer.len(), 5);
        assert!(buffer.is_full());
        assert_eq!(stored_rewards(&buffer), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn a_zero_capacity_buffer_stores_nothing() {
        let device = Device::Cpu;
        let mut buffer = ReplayBuffer::new(0);

        fill(&mut buffer, 0..3, &device);

        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert!(stored_rewards(&buffer).is_empty());
    }

    #[test]
    fn sampling_requires_more_data_than_the_batch_size() {
        let device = Device::Cpu;
        let mut buffer = ReplayBuffer::new(10);

        fill(&mut buffer, 0..4, &device);

        // equal to the batch size is still insufficient
        for batch_size in [4, 5] {
            match buffer.random_batch(batch_size) {
                Err(Td3Error::InsufficientData {
                    requested,
                    available,
                }) => {
                    assert_eq!(requested, batch_size);
                    assert_eq!(available, 4);
                }
                other => panic!("expected InsufficientData, got {other:?}"),
            }
        }
    }

    #[test]
    fn sampling_returns_distinct_transitions_with_matching_shapes() {
        let device = Device::Cpu;
        let mut buffer = ReplayBuffer::new(10);

        fill(&mut buffer, 0..8, &device);

        let (states, actions, rewards, next_states, dones) =
            buffer.random_batch(5).unwrap();

        assert_eq!(states.dims(), &[5, 2]);
        assert_eq!(actions.dims(), &[5, 1]);
        assert_eq!(rewards.dims(), &[5, 1]);
        assert_eq!(next_states.dims(), &[5, 2]);
        assert_eq!(dones.dims(), &[5, 1]);

        // rewards double as transition ids, so a without-replacement draw
        // must return five distinct values
        let mut ids: Vec<f64> = rewards
            .squeeze(1)
            .unwrap()
            .to_vec1::<f64>()
            .unwrap();
        ids.sort_by(f64::total_cmp);
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn sampling_does_not_consume_transitions() {
        let device = Device::Cpu;
        let mut buffer = ReplayBuffer::new(10);

        fill(&mut buffer, 0..6, &device);
        let before = stored_rewards(&buffer);

        buffer.random_batch(3).unwrap();
        buffer.random_batch(3).unwrap();

        assert_eq!(buffer.len(), 6);
        assert_eq!(stored_rewards(&buffer), before);
    }
}
