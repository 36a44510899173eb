//! Pure planner for the Gantt and board orderings.
//!
//! Every mutation is computed against a snapshot of the affected scope and
//! yields an [`OrderPlan`] listing only the rows whose ordering columns
//! change. Adapters lock the scope, load the snapshot, call the planner and
//! write the plan back, so both adapters share one set of semantics.

use super::{Rank, TaskId, TaskStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Ordering columns of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderEntry {
    /// Task the entry belongs to.
    pub task_id: TaskId,
    /// Board column.
    pub status: TaskStatus,
    /// Position in the project's Gantt sequence.
    pub gantt_order: Rank,
    /// Position in the board column.
    pub board_order: Rank,
}

/// Ordering-relevant part of a direct field edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderEdit {
    /// Requested board column.
    pub status: Option<TaskStatus>,
    /// Requested Gantt position.
    pub gantt_order: Option<Rank>,
    /// Requested board position.
    pub board_order: Option<Rank>,
}

impl OrderEdit {
    /// Returns `true` when the edit touches no ordering column.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.gantt_order.is_none() && self.board_order.is_none()
    }
}

/// New values for a single row. `None` leaves the column untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChange {
    /// Task to update.
    pub task_id: TaskId,
    /// New board column.
    pub status: Option<TaskStatus>,
    /// New Gantt position.
    pub gantt_order: Option<Rank>,
    /// New board position.
    pub board_order: Option<Rank>,
}

/// Rows to rewrite after a planned move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPlan {
    changes: Vec<OrderChange>,
}

impl OrderPlan {
    /// Returns the row updates in task identifier order.
    #[must_use]
    pub fn changes(&self) -> &[OrderChange] {
        &self.changes
    }

    /// Returns `true` when nothing needs to be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the update planned for `task_id`, if any.
    #[must_use]
    pub fn change_for(&self, task_id: TaskId) -> Option<&OrderChange> {
        self.changes.iter().find(|change| change.task_id == task_id)
    }
}

/// Placement computed for a task that is about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Gantt position for the new task.
    pub gantt_order: Rank,
    /// Board position for the new task.
    pub board_order: Rank,
    /// Shifts applied to existing tasks to open the slots.
    pub plan: OrderPlan,
}

/// Errors raised by the ordering planner.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum OrderingError {
    /// The task is not part of the loaded scope.
    #[error("task {0} is not part of the ordering scope")]
    TaskNotInScope(TaskId),
}

/// Snapshot of the ordering columns of one project, or of the board columns
/// touched by a move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectOrdering {
    entries: BTreeMap<TaskId, OrderEntry>,
}

impl ProjectOrdering {
    /// Builds a snapshot from loaded rows.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = OrderEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.task_id, entry))
                .collect(),
        }
    }

    /// Returns the entry for `task_id`, if loaded.
    #[must_use]
    pub fn entry(&self, task_id: TaskId) -> Option<&OrderEntry> {
        self.entries.get(&task_id)
    }

    /// Returns the number of loaded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns task identifiers in Gantt order.
    #[must_use]
    pub fn gantt_sequence(&self) -> Vec<TaskId> {
        sequence_by(self.entries.values(), |entry| entry.gantt_order)
    }

    /// Returns the identifiers of one board column in board order.
    #[must_use]
    pub fn column_sequence(&self, status: TaskStatus) -> Vec<TaskId> {
        sequence_by(
            self.entries.values().filter(|entry| entry.status == status),
            |entry| entry.board_order,
        )
    }

    /// Returns `true` when the Gantt sequence and every column are `1..=N`.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        let gantt_dense = is_contiguous(self.entries.values().map(|entry| entry.gantt_order));
        gantt_dense
            && TaskStatus::ALL.iter().all(|status| {
                is_contiguous(
                    self.entries
                        .values()
                        .filter(|entry| entry.status == *status)
                        .map(|entry| entry.board_order),
                )
            })
    }

    /// Moves a task to the 0-based `position` of the Gantt sequence.
    ///
    /// The position is clamped into `0..=len` and the whole sequence is
    /// renumbered `1..=N`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::TaskNotInScope`] when the task is not loaded.
    pub fn move_in_gantt(&self, task_id: TaskId, position: usize) -> Result<OrderPlan, OrderingError> {
        self.require(task_id)?;
        let mut work = self.entries.clone();
        reposition_gantt(&mut work, task_id, position);
        Ok(self.diff(&work))
    }

    /// Moves a task to the 0-based `position` of its own board column.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::TaskNotInScope`] when the task is not loaded.
    pub fn move_in_column(
        &self,
        task_id: TaskId,
        position: usize,
    ) -> Result<OrderPlan, OrderingError> {
        let entry = self.require(task_id)?;
        let mut work = self.entries.clone();
        reposition_column(&mut work, entry.status, task_id, position);
        Ok(self.diff(&work))
    }

    /// Moves a task into another board column at the 1-based `slot`.
    ///
    /// The old column closes its gap. In the new column a slot past the end
    /// appends, otherwise the tasks at or after the slot shift down by one.
    /// Slots below 1 clamp to 1.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::TaskNotInScope`] when the task is not loaded.
    pub fn move_to_column(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        slot: usize,
    ) -> Result<OrderPlan, OrderingError> {
        let entry = self.require(task_id)?;
        let mut work = self.entries.clone();
        change_column(&mut work, task_id, entry.status, status, slot.max(1));
        Ok(self.diff(&work))
    }

    /// Plans a board move. Without a status, or with the current one, the
    /// 0-based column move applies; otherwise the 1-based column change.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::TaskNotInScope`] when the task is not loaded.
    pub fn move_on_board(
        &self,
        task_id: TaskId,
        position: usize,
        status: Option<TaskStatus>,
    ) -> Result<OrderPlan, OrderingError> {
        let entry = self.require(task_id)?;
        match status {
            Some(target) if target != entry.status => {
                self.move_to_column(task_id, target, position)
            }
            _ => self.move_in_column(task_id, position),
        }
    }

    /// Computes the slots for a new task and the shifts that open them.
    ///
    /// Without explicit ranks the task is appended to both sequences.
    /// Explicit ranks are clamped into `1..=N+1`.
    #[must_use]
    pub fn insert(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        gantt_order: Option<Rank>,
        board_order: Option<Rank>,
    ) -> Placement {
        let mut work = self.entries.clone();
        let gantt_len = self.entries.len();
        let column_len = self.column_sequence(status).len();
        let gantt_index = gantt_order.map_or(gantt_len, |rank| rank.index().min(gantt_len));
        let board_index = board_order.map_or(column_len, |rank| rank.index().min(column_len));
        work.insert(
            task_id,
            OrderEntry {
                task_id,
                status,
                gantt_order: Rank::after_count(gantt_len),
                board_order: Rank::after_count(column_len),
            },
        );
        reposition_gantt(&mut work, task_id, gantt_index);
        reposition_column(&mut work, status, task_id, board_index);
        let placed = work.get(&task_id).copied();
        Placement {
            gantt_order: placed.map_or(Rank::FIRST, |entry| entry.gantt_order),
            board_order: placed.map_or(Rank::FIRST, |entry| entry.board_order),
            plan: self.diff(&work),
        }
    }

    /// Plans the gap closing after `task_id` is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::TaskNotInScope`] when the task is not loaded.
    pub fn remove(&self, task_id: TaskId) -> Result<OrderPlan, OrderingError> {
        let entry = self.require(task_id)?;
        let mut work = self.entries.clone();
        work.remove(&task_id);
        let gantt = sequence_by(work.values(), |row| row.gantt_order);
        assign_gantt(&mut work, &gantt);
        let column = sequence_by(
            work.values().filter(|row| row.status == entry.status),
            |row| row.board_order,
        );
        assign_board(&mut work, &column);
        Ok(self.diff(&work))
    }

    /// Plans the compensating shifts for a direct edit of the ordering
    /// columns.
    ///
    /// A Gantt edit is clamped into `1..=N` and moves the task there. A
    /// status change closes the old column and opens the new one at the
    /// requested board rank, or the previous one when not edited, clamped
    /// into `1..=N+1`. A board edit within the same column is clamped into
    /// `1..=N`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::TaskNotInScope`] when the task is not loaded.
    pub fn apply_edit(&self, task_id: TaskId, edit: OrderEdit) -> Result<OrderPlan, OrderingError> {
        let entry = self.require(task_id)?;
        let mut work = self.entries.clone();
        if let Some(gantt_order) = edit.gantt_order {
            reposition_gantt(&mut work, task_id, gantt_order.index());
        }
        match edit.status {
            Some(status) if status != entry.status => {
                let slot = edit.board_order.unwrap_or(entry.board_order);
                let slot_index = usize::try_from(slot.value()).unwrap_or(usize::MAX);
                change_column(&mut work, task_id, entry.status, status, slot_index);
            }
            _ => {
                if let Some(board_order) = edit.board_order {
                    reposition_column(&mut work, entry.status, task_id, board_order.index());
                }
            }
        }
        Ok(self.diff(&work))
    }

    fn require(&self, task_id: TaskId) -> Result<OrderEntry, OrderingError> {
        self.entries
            .get(&task_id)
            .copied()
            .ok_or(OrderingError::TaskNotInScope(task_id))
    }

    fn diff(&self, after: &BTreeMap<TaskId, OrderEntry>) -> OrderPlan {
        let changes = self
            .entries
            .values()
            .filter_map(|before| {
                let updated = after.get(&before.task_id)?;
                let change = OrderChange {
                    task_id: before.task_id,
                    status: (updated.status != before.status).then_some(updated.status),
                    gantt_order: (updated.gantt_order != before.gantt_order)
                        .then_some(updated.gantt_order),
                    board_order: (updated.board_order != before.board_order)
                        .then_some(updated.board_order),
                };
                let touched = change.status.is_some()
                    || change.gantt_order.is_some()
                    || change.board_order.is_some();
                touched.then_some(change)
            })
            .collect();
        OrderPlan { changes }
    }
}

fn sequence_by<'a>(
    entries: impl Iterator<Item = &'a OrderEntry>,
    key: impl Fn(&OrderEntry) -> Rank,
) -> Vec<TaskId> {
    let mut rows: Vec<(Rank, TaskId)> = entries.map(|entry| (key(entry), entry.task_id)).collect();
    rows.sort_unstable();
    rows.into_iter().map(|(_, task_id)| task_id).collect()
}

fn is_contiguous(ranks: impl Iterator<Item = Rank>) -> bool {
    let mut sorted: Vec<Rank> = ranks.collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(index, rank)| *rank == Rank::from_index(index))
}

fn place(sequence: &mut Vec<TaskId>, task_id: TaskId, index: usize) {
    sequence.retain(|candidate| *candidate != task_id);
    let clamped = index.min(sequence.len());
    sequence.insert(clamped, task_id);
}

fn assign_gantt(work: &mut BTreeMap<TaskId, OrderEntry>, sequence: &[TaskId]) {
    for (index, task_id) in sequence.iter().enumerate() {
        if let Some(entry) = work.get_mut(task_id) {
            entry.gantt_order = Rank::from_index(index);
        }
    }
}

fn assign_board(work: &mut BTreeMap<TaskId, OrderEntry>, sequence: &[TaskId]) {
    for (index, task_id) in sequence.iter().enumerate() {
        if let Some(entry) = work.get_mut(task_id) {
            entry.board_order = Rank::from_index(index);
        }
    }
}

fn reposition_gantt(work: &mut BTreeMap<TaskId, OrderEntry>, task_id: TaskId, index: usize) {
    let mut sequence = sequence_by(work.values(), |entry| entry.gantt_order);
    place(&mut sequence, task_id, index);
    assign_gantt(work, &sequence);
}

fn reposition_column(
    work: &mut BTreeMap<TaskId, OrderEntry>,
    status: TaskStatus,
    task_id: TaskId,
    index: usize,
) {
    let mut sequence = sequence_by(
        work.values().filter(|entry| entry.status == status),
        |entry| entry.board_order,
    );
    place(&mut sequence, task_id, index);
    assign_board(work, &sequence);
}

/// Moves `task_id` from column `from` to column `to` at the 1-based `slot`.
fn change_column(
    work: &mut BTreeMap<TaskId, OrderEntry>,
    task_id: TaskId,
    from: TaskStatus,
    to: TaskStatus,
    slot: usize,
) {
    let remaining = sequence_by(
        work.values()
            .filter(|entry| entry.status == from && entry.task_id != task_id),
        |entry| entry.board_order,
    );
    assign_board(work, &remaining);
    let mut target = sequence_by(
        work.values().filter(|entry| entry.status == to),
        |entry| entry.board_order,
    );
    if let Some(entry) = work.get_mut(&task_id) {
        entry.status = to;
    }
    place(&mut target, task_id, slot.saturating_sub(1));
    assign_board(work, &target);
}
