//! Edit log compaction.

use crate::types::{same_frame, Frame, FrameId};

use super::edit::EditOperation;

/// Reduce an edit log to an equivalent, shorter one.
///
/// Edits are folded in input order:
/// - append then remove of the same frame cancel out;
/// - remove after an update drops the update and removes the frame as it
///   was before that update, since the store never saw the new state;
/// - update after an append becomes an append of the final state;
/// - consecutive updates of one frame merge into one update from the first
///   `old` to the latest `new`;
/// - renames merge into one from the original name to the latest.
///
/// Frames without an id never merge with anything. The result is ordered
/// removals, appends, updates, rename, whatever the input interleaving.
pub fn optimize(edits: impl IntoIterator<Item = EditOperation>) -> Vec<EditOperation> {
    let mut removals: Vec<(Frame, usize)> = Vec::new();
    let mut appends: Vec<(Frame, usize)> = Vec::new();
    let mut updates: Vec<(Frame, Frame)> = Vec::new();
    let mut rename: Option<(String, String)> = None;
    let mut input_len = 0usize;

    for edit in edits {
        input_len += 1;
        match edit {
            EditOperation::Append {
                frame,
                insert_index,
            } => appends.push((frame, insert_index)),

            EditOperation::Remove { frame, old_index } => {
                let target = frame.id();
                if let Some(pos) = appends.iter().position(|(f, _)| same_frame(f.id(), target)) {
                    appends.remove(pos);
                    log::debug!("Append and remove of {:?} cancel out", target);
                } else {
                    let frame = match updates.iter().position(|u| same_frame(update_target(u), target)) {
                        Some(pos) => {
                            let (old, _) = updates.remove(pos);
                            log::debug!("Dropping update of removed frame {:?}", target);
                            carry_id(old, target)
                        }
                        None => frame,
                    };
                    removals.push((frame, old_index));
                }
            }

            EditOperation::Update { old, new } => {
                let target = old.id().or(new.id());
                if let Some(append) = appends.iter_mut().find(|(f, _)| same_frame(f.id(), target)) {
                    append.0 = carry_id(new, append.0.id());
                } else if let Some(update) = updates.iter_mut().find(|u| same_frame(update_target(u), target)) {
                    update.1 = new;
                } else if removals.iter().any(|(f, _)| same_frame(f.id(), target)) {
                    log::debug!("Ignoring update of removed frame {:?}", target);
                } else {
                    updates.push((old, new));
                }
            }

            EditOperation::Rename { old_name, new_name } => {
                rename = Some(match rename {
                    Some((original, _)) => (original, new_name),
                    None => (old_name, new_name),
                });
            }
        }
    }

    let mut out = Vec::with_capacity(removals.len() + appends.len() + updates.len() + 1);
    out.extend(
        removals
            .into_iter()
            .map(|(frame, old_index)| EditOperation::Remove { frame, old_index }),
    );
    out.extend(
        appends
            .into_iter()
            .map(|(frame, insert_index)| EditOperation::Append {
                frame,
                insert_index,
            }),
    );
    out.extend(
        updates
            .into_iter()
            .map(|(old, new)| EditOperation::Update { old, new }),
    );
    if let Some((old_name, new_name)) = rename {
        out.push(EditOperation::Rename { old_name, new_name });
    }

    log::debug!("Compacted {} edits into {}", input_len, out.len());
    out
}

fn update_target((old, new): &(Frame, Frame)) -> Option<FrameId> {
    old.id().or(new.id())
}

/// Keep the given identity when the frame has none.
fn carry_id(frame: Frame, id: Option<FrameId>) -> Frame {
    match id {
        Some(id) if frame.id().is_none() => frame.with_id(id),
        _ => frame,
    }
}
