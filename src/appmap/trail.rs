use super::types::Vec3;

/// Fixed-size ring of recent walker positions, drawn as a fading particle trail.
#[derive(Clone, Debug)]
pub struct TrailBuffer {
	slots: Vec<Vec3>,
	capacity: usize,
	particles_per_redraw: usize,
	written: usize,
	previous: Option<Vec3>,
}

impl TrailBuffer {
	/// Empty trail. Both arguments are raised to at least 1.
	pub fn new(capacity: usize, particles_per_redraw: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			slots: Vec::with_capacity(capacity),
			capacity,
			particles_per_redraw: particles_per_redraw.max(1),
			written: 0,
			previous: None,
		}
	}

	/// Samples the walker's movement since the last call.
	///
	/// Writes `particles_per_redraw` points evenly spaced from just behind `current` back to
	/// the previous sample, newest-first along the path, so the trail never covers the walker.
	/// The first call and calls without movement only remember `current`.
	/// Returns the number of particles written.
	pub fn record(&mut self, current: Vec3) -> usize {
		let previous = self.previous.replace(current);
		let Some(previous) = previous else {
			return 0;
		};
		if previous == current {
			return 0;
		}

		let count = self.particles_per_redraw;
		for step in 1..=count {
			let t = step as f32 / count as f32;
			self.push(current.lerp(&previous, t));
		}
		count
	}

	/// Writes one particle, overwriting the oldest once full.
	pub fn push(&mut self, particle: Vec3) {
		if self.slots.len() < self.capacity {
			self.slots.push(particle);
		} else {
			let slot = self.written % self.capacity;
			self.slots[slot] = particle;
		}
		self.written += 1;
	}

	/// Stored particles from oldest to newest.
	pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
		let split = if self.slots.len() < self.capacity {
			0
		} else {
			self.written % self.capacity
		};
		let (newer, older) = self.slots.split_at(split);
		older.iter().chain(newer.iter())
	}

	/// Particles stored.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Whether nothing has been written yet.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Particles written per moved frame.
	pub fn particles_per_redraw(&self) -> usize {
		self.particles_per_redraw
	}

	/// Stored particles from oldest to newest along the walker's path, each paired with its
	/// recency rank (0 for the oldest).
	///
	/// Each recorded batch is written walker-first, so within a batch the write order runs
	/// backwards along the path. The rank undoes that.
	pub fn iter_by_recency(&self) -> impl Iterator<Item = (usize, &Vec3)> {
		let k = self.particles_per_redraw;
		let first = self.written - self.slots.len();
		self.iter().enumerate().map(move |(offset, particle)| {
			let sequence = first + offset;
			let rank = (sequence / k) * k + (k - 1 - sequence % k);
			(rank.saturating_sub(first), particle)
		})
	}

	/// Most particles kept at once.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Particles written since creation, including overwritten ones.
	pub fn total_written(&self) -> usize {
		self.written
	}

	/// Last sampled walker position.
	pub fn previous(&self) -> Option<Vec3> {
		self.previous
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn at(x: f32) -> Vec3 {
		Vec3::new(x, 0.0, 0.0)
	}

	#[test]
	fn first_sample_only_sets_previous() {
		let mut trail = TrailBuffer::new(60, 4);
		assert_eq!(trail.record(at(5.0)), 0);
		assert!(trail.is_empty());
		assert_eq!(trail.previous(), Some(at(5.0)));
	}

	#[test]
	fn movement_is_split_into_particles() {
		let mut trail = TrailBuffer::new(60, 4);
		trail.record(at(0.0));
		assert_eq!(trail.record(at(100.0)), 4);

		let xs = trail.iter().map(|p| p.x).collect::<Vec<_>>();
		assert_eq!(xs, vec![75.0, 50.0, 25.0, 0.0]);
	}

	#[test]
	fn standing_still_writes_nothing() {
		let mut trail = TrailBuffer::new(60, 4);
		trail.record(at(1.0));
		trail.record(at(2.0));
		assert_eq!(trail.record(at(2.0)), 0);
		assert_eq!(trail.len(), 4);
	}

	#[test]
	fn wraps_over_oldest() {
		let mut trail = TrailBuffer::new(3, 1);
		for x in 0..5 {
			trail.push(at(x as f32));
		}
		let xs = trail.iter().map(|p| p.x).collect::<Vec<_>>();
		assert_eq!(xs, vec![2.0, 3.0, 4.0]);
		assert_eq!(trail.total_written(), 5);
	}

	#[test]
	fn recorded_particles_wrap_across_capacity() {
		let mut trail = TrailBuffer::new(6, 4);
		trail.record(at(0.0));
		trail.record(at(40.0));
		trail.record(at(80.0));
		assert_eq!(trail.record(at(120.0)), 4);

		let xs = trail.iter().map(|p| p.x).collect::<Vec<_>>();
		assert_eq!(xs, vec![50.0, 40.0, 110.0, 100.0, 90.0, 80.0]);
		assert_eq!(trail.total_written(), 12);
	}

	#[test]
	fn particles_never_sit_on_the_walker() {
		let mut trail = TrailBuffer::new(60, 5);
		trail.record(at(10.0));
		trail.record(at(60.0));
		assert!(trail.iter().all(|p| p.x < 60.0));
		assert!(trail.iter().any(|p| p.x == 10.0));
	}

	#[test]
	fn recency_follows_the_path() {
		let mut trail = TrailBuffer::new(60, 4);
		trail.record(at(0.0));
		trail.record(at(100.0));
		let mut ranked = trail.iter_by_recency().map(|(rank, p)| (rank, p.x)).collect::<Vec<_>>();
		ranked.sort_by_key(|(rank, _)| *rank);
		let xs = ranked.into_iter().map(|(_, x)| x).collect::<Vec<_>>();
		assert_eq!(xs, vec![0.0, 25.0, 50.0, 75.0]);
	}

	proptest! {
		#[test]
		fn keeps_exactly_the_most_recent(capacity in 1usize..80, count in 0usize..400) {
			let mut trail = TrailBuffer::new(capacity, 4);
			for i in 0..count {
				trail.push(at(i as f32));
			}

			let kept = trail.iter().map(|p| p.x as usize).collect::<Vec<_>>();
			let expected = (count.saturating_sub(capacity)..count).collect::<Vec<_>>();
			prop_assert_eq!(kept, expected);
		}

		#[test]
		fn recording_keeps_the_latest_particles(
			capacity in 1usize..40,
			k in 1usize..8,
			moves in 1usize..30,
		) {
			let mut trail = TrailBuffer::new(capacity, k);
			trail.record(at(0.0));
			for step in 1..=moves {
				prop_assert_eq!(trail.record(at((step * 10) as f32)), k);
			}

			prop_assert_eq!(trail.total_written(), moves * k);
			prop_assert_eq!(trail.len(), (moves * k).min(capacity));
			let newest = trail.iter().last().map(|p| p.x);
			prop_assert_eq!(newest, Some(((moves - 1) * 10) as f32));
		}
	}
}
