//! The simulation context.
//!
//! [`GameState`] owns the map, the piece registry, every team and the phase
//! controller. Callers attach orders with [`GameState::set_order`], submit
//! with [`GameState::submit_turn`] and drive execution with
//! [`GameState::advance`]. Everything that happens is queued as a
//! [`Notification`] and handed out by [`GameState::drain_notifications`].

use tracing::{debug, info, trace, warn};

use crate::error::OrderError;
use crate::game::events::{CancelReason, Notification, OrderEntry, TerrainCause};
use crate::game::phase::{AdvanceBlocked, Transition, TurnController};
use crate::game::{
    combat, economy, validator, Coord, DamageType, Map, Order, Phase, Piece, PieceAttributes, PieceKind,
    PieceRegistry, RuleSet, Team, TeamId, Teams, TileKind,
};
use crate::path::movement_preview;

/// Result of a turn submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Other teams still have to submit.
    Waiting,
    /// Every team submitted and the turn left ORDERS.
    Accepted,
    /// Every team submitted but these teams' orders were rejected.
    Rejected(Vec<TeamId>),
}

/// Complete match state.
#[derive(Debug, Clone)]
pub struct GameState {
    /// The terrain.
    pub map: Map,
    /// Every piece on the map.
    pub registry: PieceRegistry,
    /// Every team, eliminated ones included.
    pub teams: Teams,
    /// Base rules every team was seeded from.
    pub rules: RuleSet,
    controller: TurnController,
    outbox: Vec<Notification>,
    game_over: bool,
}

impl GameState {
    /// A fresh match at START_TURN of turn 1 with no pieces.
    #[must_use]
    pub fn new(map: Map, rules: RuleSet, team_ids: &[TeamId], starting_resources: u32) -> Self {
        let teams: Teams = team_ids
            .iter()
            .map(|id| (*id, Team::new(*id, starting_resources, &rules.attributes)))
            .collect();
        Self::from_parts(map, rules, teams, PieceRegistry::new())
    }

    /// Assemble a match from loaded parts.
    #[must_use]
    pub fn from_parts(map: Map, rules: RuleSet, teams: Teams, registry: PieceRegistry) -> Self {
        let controller = TurnController::new(
            teams
                .values()
                .filter(|team| !team.eliminated)
                .map(|team| team.id),
        );
        Self {
            map,
            registry,
            teams,
            rules,
            controller,
            outbox: Vec::new(),
            game_over: false,
        }
    }

    /// Place a new piece at full health using its team's attributes.
    ///
    /// Returns `false` if the team is unknown, the tile is off the map, or the
    /// team already has a piece there.
    pub fn spawn(&mut self, team: TeamId, kind: PieceKind, at: Coord) -> bool {
        let Some(owner) = self.teams.get(&team) else {
            return false;
        };
        if !self.map.in_bounds(at) || self.registry.get(at, team).is_some() {
            return false;
        }
        self.registry.register(Piece::new(team, kind, at, owner.attrs(kind)));
        true
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Current turn number.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.controller.turn()
    }

    /// The phase controller.
    #[must_use]
    pub const fn controller(&self) -> &TurnController {
        &self.controller
    }

    /// Jump to a saved phase and turn.
    pub fn restore_phase(&mut self, phase: Phase, turn: u32) {
        self.controller.restore(phase, turn);
    }

    /// Teams still in the match.
    pub fn active_teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.controller.active_teams()
    }

    /// Attributes governing `piece`.
    #[must_use]
    pub fn attrs_of(&self, piece: &Piece) -> Option<&PieceAttributes> {
        self.teams.get(&piece.team).map(|team| team.attrs(piece.kind))
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// The last team standing, once the match is over.
    #[must_use]
    pub fn winner(&self) -> Option<TeamId> {
        if !self.game_over {
            return None;
        }
        let mut active = self.controller.active_teams();
        match (active.next(), active.next()) {
            (Some(team), None) => Some(team),
            _ => None,
        }
    }

    /// Take every queued notification.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    /// Notifications queued so far.
    #[must_use]
    pub fn pending_notifications(&self) -> &[Notification] {
        &self.outbox
    }

    fn emit(&mut self, notification: Notification) {
        trace!(?notification, "notify");
        self.outbox.push(notification);
    }

    fn check_accepting(&self, team: TeamId) -> Result<(), OrderError> {
        if self.phase() != Phase::Orders || self.game_over {
            return Err(OrderError::WrongPhase(self.phase()));
        }
        if !self.controller.active_teams().any(|t| t == team) {
            return Err(OrderError::InactiveTeam(team));
        }
        if self.controller.is_submitted(team) {
            return Err(OrderError::AlreadySubmitted(team));
        }
        Ok(())
    }

    /// Attach `order` to `team`'s piece at `at`, replacing any previous order.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] when the phase, team or piece is wrong or the
    /// order is not something this piece can do from where it stands.
    pub fn set_order(&mut self, team: TeamId, at: Coord, order: Order) -> Result<(), OrderError> {
        self.check_accepting(team)?;
        let piece = self
            .registry
            .get(at, team)
            .ok_or(OrderError::NoPiece { coord: at, team })?;
        let owner = self.teams.get(&team).ok_or(OrderError::InactiveTeam(team))?;
        let attrs = owner.attrs(piece.kind);
        let not_capable = OrderError::NotCapable {
            kind: piece.kind,
            order: order.name(),
        };

        match order {
            Order::Move { dest } => {
                if !attrs.is_mobile() {
                    return Err(not_capable);
                }
                if !movement_preview(&self.map, &self.registry, piece, attrs).contains(&dest) {
                    return Err(OrderError::Unreachable(dest));
                }
            }
            Order::RangedAttack { target } => {
                if attrs.damage_type != DamageType::Ranged {
                    return Err(not_capable);
                }
                let distance = at.distance(target);
                if !self.map.in_bounds(target)
                    || distance < attrs.min_range
                    || distance > attrs.max_range
                {
                    return Err(OrderError::OutOfRange(target));
                }
            }
            Order::Build { dest, kind } => {
                if !attrs.buildable.contains(&kind) {
                    return Err(OrderError::NotBuildable(kind));
                }
                if !at.is_adjacent(dest) {
                    return Err(OrderError::NotAdjacent(dest));
                }
                if !build_site_ok(&self.map, kind, owner.attrs(kind), dest) {
                    return Err(OrderError::InvalidSite(dest));
                }
            }
            Order::Upgrade { upgrade } => {
                if !attrs.upgrades.contains(&upgrade) {
                    return Err(OrderError::NotPurchasable(upgrade));
                }
            }
            Order::Terraform { dest, raising } => {
                if !attrs.flags.terraformer {
                    return Err(not_capable);
                }
                if !at.is_adjacent(dest) {
                    return Err(OrderError::NotAdjacent(dest));
                }
                if self
                    .map
                    .get(dest)
                    .and_then(|tile| tile.terraformed(raising))
                    .is_none()
                {
                    return Err(OrderError::InvalidSite(dest));
                }
            }
            Order::Demolish => {
                if !attrs.is_structure() {
                    return Err(not_capable);
                }
            }
            Order::Heal => {
                if attrs.flags.heal == 0 {
                    return Err(not_capable);
                }
            }
        }

        debug!(%team, %at, order = order.name(), "order set");
        if let Some(piece) = self.registry.get_mut(at, team) {
            piece.order = Some(order);
        }
        Ok(())
    }

    /// Remove the order of `team`'s piece at `at`.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] outside ORDERS or when there is no such piece.
    pub fn clear_order(&mut self, team: TeamId, at: Coord) -> Result<(), OrderError> {
        self.check_accepting(team)?;
        let piece = self
            .registry
            .get_mut(at, team)
            .ok_or(OrderError::NoPiece { coord: at, team })?;
        piece.order = None;
        Ok(())
    }

    /// Current order of every piece of `team`.
    #[must_use]
    pub fn team_orders(&self, team: TeamId) -> Vec<OrderEntry> {
        self.registry
            .team_pieces(team)
            .map(|piece| OrderEntry {
                gx: piece.position.x,
                gy: piece.position.y,
                order: piece.order,
            })
            .collect()
    }

    /// Mark `team`'s orders final.
    ///
    /// Once every active team has submitted the orders are validated and, if
    /// all pass, the match leaves ORDERS.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] outside ORDERS, for an inactive team, or if
    /// the team already submitted.
    pub fn submit_turn(&mut self, team: TeamId) -> Result<SubmitOutcome, OrderError> {
        self.check_accepting(team)?;
        self.controller.submit(team);
        let orders = self.team_orders(team);
        debug!(%team, pieces = orders.len(), "turn submitted");
        self.emit(Notification::TurnSubmitted { team, orders });

        if !self.controller.all_submitted() {
            return Ok(SubmitOutcome::Waiting);
        }
        self.emit(Notification::AllTurnsSubmitted);
        match self.advance() {
            Ok(_) => Ok(SubmitOutcome::Accepted),
            Err(AdvanceBlocked::Rejected(teams)) => Ok(SubmitOutcome::Rejected(teams)),
            Err(_) => Ok(SubmitOutcome::Waiting),
        }
    }

    /// Withdraw `team`'s submission so it can change its orders.
    pub fn revise_turn(&mut self, team: TeamId) -> bool {
        if !self.controller.revise(team) {
            return false;
        }
        self.emit(Notification::TurnRevised { team });
        true
    }

    /// Move to the next phase and run its effects.
    ///
    /// Entering START_TURN pays income and continues straight into ORDERS, so
    /// six calls from ORDERS come back to ORDERS one turn later. A state that
    /// still sits at START_TURN (new or restored) is entered first.
    ///
    /// # Errors
    ///
    /// Returns why the match could not leave the current phase.
    pub fn advance(&mut self) -> Result<Phase, AdvanceBlocked> {
        if self.game_over {
            return Err(AdvanceBlocked::GameOver);
        }
        if self.phase() == Phase::StartTurn {
            self.emit(Notification::PhaseStarted {
                phase: Phase::StartTurn,
                turn_number: self.turn(),
            });
            self.enter(Phase::StartTurn);
        }

        let mut failures = Vec::new();
        let registry = &self.registry;
        let teams = &self.teams;
        let rules = &self.rules;
        let result = self.controller.advance(|team| {
            let Some(team) = teams.get(&team) else {
                return true;
            };
            let found = validator::validate_team(registry, team, rules);
            let ok = found.is_empty();
            failures.extend(found);
            ok
        });

        let transition = match result {
            Ok(transition) => transition,
            Err(blocked) => {
                if !failures.is_empty() {
                    warn!(turn = self.turn(), count = failures.len(), "order validation failed");
                }
                for failure in failures {
                    self.emit(failure);
                }
                return Err(blocked);
            }
        };

        self.announce(transition);
        self.enter(transition.to);

        if transition.to == Phase::StartTurn && !self.game_over {
            let chained = self.controller.advance(|_| true)?;
            self.announce(chained);
            self.enter(chained.to);
        }
        Ok(self.phase())
    }

    /// Advance until ORDERS is reached or the match ends.
    ///
    /// # Errors
    ///
    /// Returns an error only if called while ORDERS is blocked.
    pub fn run_until_orders(&mut self) -> Result<Phase, AdvanceBlocked> {
        loop {
            if self.game_over {
                return Ok(self.phase());
            }
            if self.phase() == Phase::Orders {
                return Ok(Phase::Orders);
            }
            self.advance()?;
        }
    }

    fn announce(&mut self, transition: Transition) {
        for piece in self.registry.iter_mut() {
            piece.modifiers.clear();
        }
        self.emit(Notification::Cleanup);
        if transition.from == Phase::Orders {
            self.emit(Notification::PhaseEnded {
                phase: transition.from,
            });
        }
        self.emit(Notification::PhaseChanged {
            from: transition.from,
            to: transition.to,
        });
        self.emit(Notification::PhaseStarted {
            phase: transition.to,
            turn_number: transition.turn,
        });
    }

    fn enter(&mut self, phase: Phase) {
        match phase {
            Phase::StartTurn => {
                for piece in self.registry.iter_mut() {
                    piece.acted = false;
                }
                economy::produce_income(&self.registry, &mut self.teams, &mut self.outbox);
            }
            Phase::Orders => {}
            Phase::ExecuteBuild => self.execute_build(),
            Phase::ExecuteMove => self.execute_move(),
            Phase::ExecuteCombat => {
                combat::apply_fortify(&mut self.registry, &self.teams);
                combat::resolve_melee(&mut self.registry, &self.teams, &mut self.outbox);
                combat::settle_steals(&mut self.registry, &mut self.teams, &mut self.outbox);
                combat::reap_dead(&mut self.registry, &self.teams, &mut self.outbox);
            }
            Phase::ExecuteRanged => {
                combat::resolve_ranged(&mut self.registry, &mut self.teams, &mut self.outbox);
            }
            Phase::ExecuteSpecial => {
                self.execute_special();
                for piece in self.registry.iter_mut() {
                    piece.order = None;
                }
            }
        }
        if phase.is_execute() {
            self.check_elimination();
        }
    }

    fn cancel(&mut self, at: Coord, team: TeamId, reason: CancelReason) {
        debug!(%at, %team, ?reason, "order canceled");
        self.emit(Notification::OrderCanceled {
            gx: at.x,
            gy: at.y,
            team,
            reason,
        });
    }

    /// Orders of one phase, taken off their pieces.
    fn take_orders(&mut self, wanted: impl Fn(&Order) -> bool) -> Vec<(Coord, TeamId, PieceKind, Order)> {
        let mut taken = Vec::new();
        for piece in self.registry.iter_mut() {
            if let Some(order) = piece.order.filter(|o| wanted(o)) {
                piece.order = None;
                piece.acted = true;
                taken.push((piece.position, piece.team, piece.kind, order));
            }
        }
        taken
    }

    fn execute_build(&mut self) {
        let orders = self.take_orders(|o| {
            matches!(o, Order::Build { .. } | Order::Upgrade { .. } | Order::Demolish)
        });
        for (at, team, kind, order) in orders {
            match order {
                Order::Build { dest, kind: new_kind } => self.execute_single_build(at, team, dest, new_kind),
                Order::Upgrade { upgrade } => {
                    let Some(owner) = self.teams.get_mut(&team) else {
                        continue;
                    };
                    match economy::purchase_upgrade(owner, &self.rules, &mut self.registry, kind, upgrade) {
                        Ok(unlocked) => {
                            info!(%team, %upgrade, "upgrade purchased");
                            self.emit(Notification::UpgradePurchased {
                                team,
                                upgrade,
                                unlocked,
                            });
                        }
                        Err(reason) => self.cancel(at, team, reason),
                    }
                }
                Order::Demolish => {
                    if self.registry.remove(at, team).is_some() {
                        debug!(%at, %team, %kind, "demolished");
                        self.emit(Notification::PieceDemolished {
                            gx: at.x,
                            gy: at.y,
                            team,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    fn execute_single_build(&mut self, at: Coord, team: TeamId, dest: Coord, kind: PieceKind) {
        if self.registry.has_enemy_at(dest, team) {
            self.cancel(at, team, CancelReason::Contested);
            return;
        }
        let Some(owner) = self.teams.get_mut(&team) else {
            return;
        };
        let attrs = owner.attrs(kind);
        if self.registry.is_occupied(dest) || !build_site_ok(&self.map, kind, attrs, dest) {
            self.cancel(at, team, CancelReason::InvalidSite);
            return;
        }
        if attrs.price > owner.resources {
            self.cancel(at, team, CancelReason::Unaffordable);
            return;
        }
        let price = attrs.price;
        let piece = Piece::new(team, kind, dest, attrs);
        economy::deduct_resources(owner, price);
        self.registry.register(piece);
        info!(%team, %kind, at = %dest, "piece built");
        self.emit(Notification::PieceBuilt {
            tx: dest.x,
            ty: dest.y,
            team,
            new_piece_kind: kind,
        });

        if kind == PieceKind::Mine && self.map.get(dest) == Some(TileKind::Resource) {
            self.map.set(dest, TileKind::Grass);
            self.emit(Notification::TileChanged {
                x: dest.x,
                y: dest.y,
                from: TileKind::Resource,
                to: TileKind::Grass,
                cause: TerrainCause::Mined,
            });
        }
    }

    fn execute_move(&mut self) {
        let movers: Vec<(Coord, TeamId, Coord)> = self
            .registry
            .iter()
            .filter_map(|p| match p.order {
                Some(Order::Move { dest }) => Some((p.position, p.team, dest)),
                _ => None,
            })
            .collect();

        let lifted: Vec<(Piece, Coord)> = movers
            .into_iter()
            .filter_map(|(from, team, dest)| self.registry.remove(from, team).map(|p| (p, dest)))
            .collect();

        for (mut piece, dest) in lifted {
            let from = piece.position;
            piece.position = dest;
            piece.order = None;
            piece.acted = true;
            let team = piece.team;
            self.registry.register(piece);
            self.emit(Notification::PieceMoved { team, from, to: dest });
        }
    }

    fn execute_special(&mut self) {
        let orders = self.take_orders(|o| matches!(o, Order::Heal | Order::Terraform { .. }));
        for (at, team, kind, order) in orders {
            match order {
                Order::Heal => {
                    let amount = self
                        .teams
                        .get(&team)
                        .map_or(0, |owner| owner.attrs(kind).flags.heal);
                    let targets: Vec<Coord> = at.around().collect();
                    for target in targets {
                        let Some(ally) = self.registry.get_mut(target, team) else {
                            continue;
                        };
                        let gained = ally.heal(amount);
                        if gained > 0 {
                            self.emit(Notification::PieceHealed {
                                gx: target.x,
                                gy: target.y,
                                team,
                                amount: gained,
                            });
                        }
                    }
                }
                Order::Terraform { dest, raising } => {
                    if self.registry.is_occupied(dest) {
                        self.cancel(at, team, CancelReason::InvalidSite);
                        continue;
                    }
                    let Some(from) = self.map.get(dest) else {
                        continue;
                    };
                    let Some(to) = from.terraformed(raising) else {
                        self.cancel(at, team, CancelReason::InvalidSite);
                        continue;
                    };
                    self.map.set(dest, to);
                    info!(%team, at = %dest, ?from, ?to, "terrain changed");
                    self.emit(Notification::TileChanged {
                        x: dest.x,
                        y: dest.y,
                        from,
                        to,
                        cause: TerrainCause::Terraformed,
                    });
                }
                _ => {}
            }
        }
    }

    fn check_elimination(&mut self) {
        let fallen: Vec<TeamId> = self
            .controller
            .active_teams()
            .filter(|team| self.registry.team_count(*team) == 0)
            .collect();
        for team in fallen {
            if let Some(state) = self.teams.get_mut(&team) {
                state.eliminate();
            }
            self.controller.remove_team(team);
            info!(%team, turn = self.turn(), "team eliminated");
            self.emit(Notification::TeamEliminated { team });
        }

        if !self.game_over && self.controller.active_teams().count() <= 1 {
            self.game_over = true;
            let winner = self.winner();
            info!(?winner, turn = self.turn(), "game over");
            self.emit(Notification::GameOver { winner });
        }
    }
}

/// Whether a new `kind` piece may be placed on `dest`.
///
/// Mines need a deposit, other buildings need grass, units need a tile they
/// can stand on.
#[must_use]
pub fn build_site_ok(map: &Map, kind: PieceKind, attrs: &PieceAttributes, dest: Coord) -> bool {
    match map.get(dest) {
        None => false,
        Some(tile) if kind == PieceKind::Mine => tile == TileKind::Resource,
        Some(tile) if attrs.is_structure() => tile == TileKind::Grass,
        Some(_) => map.is_passable(dest, attrs.movement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::UpgradeKind;

    fn create_test_game() -> GameState {
        let map = Map::new(8, 8).unwrap();
        let mut state = GameState::new(map, RuleSet::base(), &[TeamId::Red, TeamId::Blue], 10);
        state.spawn(TeamId::Red, PieceKind::Base, Coord::new(1, 1));
        state.spawn(TeamId::Red, PieceKind::Trooper, Coord::new(2, 2));
        state.spawn(TeamId::Blue, PieceKind::Base, Coord::new(6, 6));
        state.spawn(TeamId::Blue, PieceKind::Trooper, Coord::new(5, 5));
        state.advance().unwrap();
        state.drain_notifications();
        state
    }

    fn submit_all(state: &mut GameState) -> SubmitOutcome {
        state.submit_turn(TeamId::Red).unwrap();
        state.submit_turn(TeamId::Blue).unwrap()
    }

    #[test]
    fn test_start_enters_orders_with_income() {
        let state = create_test_game();
        assert_eq!(state.phase(), Phase::Orders);
        assert_eq!(state.turn(), 1);
        assert_eq!(state.teams[&TeamId::Red].resources, 13);
    }

    #[test]
    fn test_set_order_rejects_unreachable() {
        let mut state = create_test_game();
        let err = state
            .set_order(TeamId::Red, Coord::new(2, 2), Order::Move { dest: Coord::new(7, 7) })
            .unwrap_err();
        assert_eq!(err, OrderError::Unreachable(Coord::new(7, 7)));
    }

    #[test]
    fn test_set_order_rejects_wrong_capability() {
        let mut state = create_test_game();
        let err = state.set_order(TeamId::Red, Coord::new(2, 2), Order::Heal).unwrap_err();
        assert!(matches!(err, OrderError::NotCapable { kind: PieceKind::Trooper, .. }));
    }

    #[test]
    fn test_set_order_after_submit_rejected() {
        let mut state = create_test_game();
        state.submit_turn(TeamId::Red).unwrap();
        assert_eq!(
            state.set_order(TeamId::Red, Coord::new(2, 2), Order::Move { dest: Coord::new(2, 3) }),
            Err(OrderError::AlreadySubmitted(TeamId::Red))
        );
        assert!(state.revise_turn(TeamId::Red));
        assert!(state
            .set_order(TeamId::Red, Coord::new(2, 2), Order::Move { dest: Coord::new(2, 3) })
            .is_ok());
    }

    #[test]
    fn test_submission_barrier() {
        let mut state = create_test_game();
        assert_eq!(state.submit_turn(TeamId::Red).unwrap(), SubmitOutcome::Waiting);
        assert_eq!(state.submit_turn(TeamId::Blue).unwrap(), SubmitOutcome::Accepted);
        assert_eq!(state.phase(), Phase::ExecuteBuild);
        let events = state.drain_notifications();
        assert!(events.contains(&Notification::AllTurnsSubmitted));
        assert!(events.contains(&Notification::PhaseEnded { phase: Phase::Orders }));
    }

    #[test]
    fn test_move_executes() {
        let mut state = create_test_game();
        state
            .set_order(TeamId::Red, Coord::new(2, 2), Order::Move { dest: Coord::new(3, 3) })
            .unwrap();
        submit_all(&mut state);
        state.run_until_orders().unwrap();

        assert!(state.registry.get(Coord::new(3, 3), TeamId::Red).is_some());
        assert!(state.registry.get(Coord::new(2, 2), TeamId::Red).is_none());
        assert_eq!(state.turn(), 2);
    }

    #[test]
    fn test_mover_gets_no_fortify() {
        let map = Map::new(8, 8).unwrap();
        let mut state = GameState::new(map, RuleSet::base(), &[TeamId::Red, TeamId::Blue], 0);
        state.spawn(TeamId::Red, PieceKind::Trooper, Coord::new(2, 2));
        state.spawn(TeamId::Blue, PieceKind::Trooper, Coord::new(3, 3));
        state.teams.get_mut(&TeamId::Blue).unwrap().attributes.get_mut(PieceKind::Trooper).attack = 4;
        state.advance().unwrap();
        state
            .set_order(TeamId::Red, Coord::new(2, 2), Order::Move { dest: Coord::new(3, 3) })
            .unwrap();
        submit_all(&mut state);
        state.run_until_orders().unwrap();

        // Red moved: floor(4 * 0.9) = 3. Blue stayed put and is fortified: floor(2 * 0.7) = 1.
        assert_eq!(state.registry.get(Coord::new(3, 3), TeamId::Red).unwrap().hp, 2);
        assert_eq!(state.registry.get(Coord::new(3, 3), TeamId::Blue).unwrap().hp, 4);
        assert!(state.registry.iter().all(|p| !p.acted));
    }

    #[test]
    fn test_build_deducts_and_places() {
        let mut state = create_test_game();
        state
            .set_order(
                TeamId::Red,
                Coord::new(1, 1),
                Order::Build {
                    dest: Coord::new(1, 2),
                    kind: PieceKind::Builder,
                },
            )
            .unwrap();
        submit_all(&mut state);

        assert_eq!(state.phase(), Phase::ExecuteBuild);
        assert_eq!(state.teams[&TeamId::Red].resources, 10);
        let built = state.registry.get(Coord::new(1, 2), TeamId::Red).unwrap();
        assert_eq!(built.kind, PieceKind::Builder);
        assert!(state.drain_notifications().contains(&Notification::PieceBuilt {
            tx: 1,
            ty: 2,
            team: TeamId::Red,
            new_piece_kind: PieceKind::Builder,
        }));
    }

    #[test]
    fn test_upgrade_purchase_executes() {
        let mut state = create_test_game();
        state
            .set_order(TeamId::Red, Coord::new(1, 1), Order::Upgrade { upgrade: UpgradeKind::Forging })
            .unwrap();
        submit_all(&mut state);

        let red = &state.teams[&TeamId::Red];
        assert!(red.owns(UpgradeKind::Forging));
        assert_eq!(red.resources, 7);
    }

    #[test]
    fn test_mine_consumes_deposit() {
        let mut map = Map::new(6, 6).unwrap();
        map.set(Coord::new(2, 3), TileKind::Resource);
        let mut state = GameState::new(map, RuleSet::base(), &[TeamId::Red, TeamId::Blue], 10);
        state.spawn(TeamId::Red, PieceKind::Builder, Coord::new(2, 2));
        state.spawn(TeamId::Blue, PieceKind::Trooper, Coord::new(5, 5));
        state.advance().unwrap();
        state
            .set_order(
                TeamId::Red,
                Coord::new(2, 2),
                Order::Build {
                    dest: Coord::new(2, 3),
                    kind: PieceKind::Mine,
                },
            )
            .unwrap();
        submit_all(&mut state);

        assert_eq!(state.map.get(Coord::new(2, 3)), Some(TileKind::Grass));
        assert!(state
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::TileChanged { cause: TerrainCause::Mined, .. })));
    }

    #[test]
    fn test_elimination_ends_game() {
        let map = Map::new(4, 4).unwrap();
        let mut state = GameState::new(map, RuleSet::base(), &[TeamId::Red, TeamId::Blue], 0);
        state.spawn(TeamId::Red, PieceKind::Trooper, Coord::new(0, 0));
        state.spawn(TeamId::Blue, PieceKind::Builder, Coord::new(0, 1));
        state.advance().unwrap();
        state
            .set_order(TeamId::Red, Coord::new(0, 0), Order::Move { dest: Coord::new(0, 1) })
            .unwrap();
        submit_all(&mut state);
        for _ in 0..10 {
            if state.is_game_over() {
                break;
            }
            if state.phase() == Phase::Orders {
                submit_all(&mut state);
            } else {
                state.advance().unwrap();
            }
        }

        assert!(state.is_game_over());
        assert_eq!(state.winner(), Some(TeamId::Red));
        assert!(state.teams[&TeamId::Blue].eliminated);
        assert_eq!(state.advance(), Err(AdvanceBlocked::GameOver));
    }
}
