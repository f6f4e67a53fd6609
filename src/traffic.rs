use crate::config::{ArrivalProcess, RoadBoundary, TrafficConfig};
use crate::debug::debug_interval;
use crate::error::{SimResult, SimulationError};
use crate::road::RoadModel;
use crate::uav::Uav;
use crate::vehicle::{Vehicle, VehicleAttributes};
use crate::visibility::OcclusionSet;
use crate::{VehicleId, VehicleSet};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};
use smallvec::SmallVec;

/// The vehicles on the road.
#[derive(Clone, Debug)]
pub struct TrafficModel {
    /// The traffic configuration.
    config: TrafficConfig,
    /// The road length in m.
    road_length: f64,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The vehicles ordered by position, rearmost first.
    order: Vec<VehicleId>,
    /// The distribution of desired speeds.
    speeds: Normal<f64>,
    /// The time until the next vehicle arrives in s.
    next_arrival: f64,
    /// The number of arrived vehicles waiting for the entry to clear.
    pending: usize,
    /// The random number generator.
    rng: StdRng,
}

impl TrafficModel {
    /// Creates the traffic for a road of the given length, placing the
    /// configured number of initial vehicles uniformly at random.
    pub fn new(config: &TrafficConfig, road_length: f64, rng: StdRng) -> SimResult<Self> {
        config.validate(road_length)?;
        let speeds = Normal::new(config.speed.mean, config.speed.stddev).map_err(|_| {
            SimulationError::InvalidConfiguration {
                field: "traffic.speed",
                reason: "is not a valid normal distribution",
            }
        })?;

        let mut traffic = Self {
            config: config.clone(),
            road_length,
            vehicles: VehicleSet::default(),
            order: vec![],
            speeds,
            next_arrival: 0.0,
            pending: 0,
            rng,
        };
        traffic.next_arrival = traffic.sample_interarrival();

        for _ in 0..config.initial_vehicles {
            let pos = traffic.rng.gen_range(0.0..road_length);
            let attributes = traffic.sample_attributes();
            traffic.add_vehicle(&attributes, pos);
        }

        Ok(traffic)
    }

    /// The attributes of a vehicle driving at the mean desired speed.
    pub fn default_attributes(&self) -> VehicleAttributes {
        VehicleAttributes {
            length: self.config.vehicle_length,
            desired_speed: self.config.speed.mean,
            time_headway: self.config.time_headway,
        }
    }

    /// Adds a vehicle with its rear at `pos`.
    pub fn add_vehicle(&mut self, attributes: &VehicleAttributes, pos: f64) -> VehicleId {
        let vehicle_id = self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, attributes, pos));
        self.insert_ordered(vehicle_id);
        vehicle_id
    }

    /// Removes a vehicle from the road.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<Vehicle> {
        let vehicle = self.vehicles.remove(id)?;
        if let Some(idx) = self.order.iter().rposition(|v| *v == id) {
            self.order.remove(idx);
        }
        Some(vehicle)
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Returns an iterator over the vehicles, rearmost first.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.order.iter().map(|id| &self.vehicles[*id])
    }

    /// The number of vehicles on the road.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the road is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Advances the traffic by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.apply_following();
        self.integrate(dt);
        match self.config.boundary {
            RoadBoundary::Open => {
                self.remove_exited();
                self.handle_arrivals(dt);
            }
            RoadBoundary::Ring => self.wrap_vehicles(),
        }
    }

    /// Computes the set of segments hidden from the UAV by any vehicle.
    pub fn occlusion(&self, road: &RoadModel, uav: &Uav, occlusion: &mut OcclusionSet) {
        occlusion.clear();
        let eye_pos = uav.sensor_pos();
        for vehicle in self.iter_vehicles() {
            let shadow = vehicle.shadow(&self.config.shadow, eye_pos);
            debug_interval("shadow", shadow);
            for idx in road.occluded_span(shadow) {
                occlusion.insert(idx);
            }
        }
    }

    /// Chooses every vehicle's velocity from the positions at the start of the step.
    ///
    /// The front-most vehicle always drives freely. On a ring road a vehicle
    /// overlapping its leader measures the gap the long way round the ring,
    /// so overlapping vehicles drive through each other instead of stopping.
    fn apply_following(&mut self) {
        let ring = self.config.boundary == RoadBoundary::Ring;
        let leaders = self
            .order
            .iter()
            .enumerate()
            .map(|(idx, vehicle_id)| {
                let leader_rear = self.vehicles[*self.order.get(idx + 1)?].pos_rear();
                if ring && leader_rear < self.vehicles[*vehicle_id].pos_front() {
                    Some(leader_rear + self.road_length)
                } else {
                    Some(leader_rear)
                }
            })
            .collect::<SmallVec<[_; 64]>>();

        for (vehicle_id, leader_rear) in self.order.iter().zip(leaders) {
            self.vehicles[*vehicle_id].follow(leader_rear);
        }
    }

    /// Integrates the positions of all vehicles.
    fn integrate(&mut self, dt: f64) {
        for (_, vehicle) in &mut self.vehicles {
            vehicle.integrate(dt);
        }
    }

    /// Moves vehicles which passed the end of a ring road back to its start,
    /// then restores the order, which wrapping or overlapping vehicles
    /// driving through each other may have changed.
    fn wrap_vehicles(&mut self) {
        let road_length = self.road_length;
        for (_, vehicle) in &mut self.vehicles {
            if vehicle.wrap(road_length) {
                trace!("vehicle {:?} wrapped to {:.2}", vehicle.id, vehicle.pos_rear());
            }
        }
        let vehicles = &self.vehicles;
        self.order
            .sort_by(|a, b| vehicles[*a].pos_rear().total_cmp(&vehicles[*b].pos_rear()));
    }

    /// Removes vehicles whose rear has passed the end of the road.
    fn remove_exited(&mut self) {
        let road_length = self.road_length;
        let exited = self
            .order
            .iter()
            .copied()
            .filter(|id| self.vehicles[*id].pos_rear() > road_length)
            .collect::<SmallVec<[_; 8]>>();

        for vehicle_id in exited {
            self.remove_vehicle(vehicle_id);
            debug!("vehicle {:?} left the road", vehicle_id);
        }
    }

    /// Counts down to the next arrivals and lets waiting vehicles enter the road.
    fn handle_arrivals(&mut self, dt: f64) {
        if self.config.arrivals == ArrivalProcess::None {
            return;
        }

        self.next_arrival -= dt;
        while self.next_arrival <= 0.0 {
            self.pending += 1;
            self.next_arrival += self.sample_interarrival();
        }

        if self.pending == 0 {
            return;
        }
        let entry_clear = self
            .order
            .first()
            .map(|id| self.vehicles[*id].pos_rear() >= 0.0)
            .unwrap_or(true);
        if entry_clear {
            self.pending -= 1;
            let attributes = self.sample_attributes();
            let vehicle_id = self.add_vehicle(&attributes, -attributes.length);
            debug!("vehicle {:?} entered the road", vehicle_id);
        } else {
            trace!("entry blocked, {} arrivals waiting", self.pending);
        }
    }

    /// Inserts a vehicle into the ordered list according to its position.
    fn insert_ordered(&mut self, id: VehicleId) {
        let veh_pos = self.vehicles[id].pos_rear();
        let idx = self
            .order
            .iter()
            .map(|id| self.vehicles[*id].pos_rear())
            .position(|pos| pos > veh_pos)
            .unwrap_or(self.order.len());
        self.order.insert(idx, id);
    }

    /// Samples the time until the next arrival in s.
    fn sample_interarrival(&mut self) -> f64 {
        match self.config.arrivals {
            ArrivalProcess::None => f64::INFINITY,
            ArrivalProcess::FixedInterval { period } => period,
            ArrivalProcess::Poisson { rate } => match Exp::new(rate) {
                Ok(distr) => distr.sample(&mut self.rng),
                Err(_) => f64::INFINITY,
            },
        }
    }

    /// Samples the attributes of a new vehicle.
    fn sample_attributes(&mut self) -> VehicleAttributes {
        VehicleAttributes {
            desired_speed: self.speeds.sample(&mut self.rng).abs(),
            ..self.default_attributes()
        }
    }
}
