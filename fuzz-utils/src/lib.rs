use arbitrary::{Arbitrary, Unstructured};
use hyperion::mock::Mock;
use hyperion::param::NodeLimits;
use hyperion::AList;
use std::fmt::{self, Debug, Display, Formatter};

const BASIC_VARIANTS: u8 = 6;

/// A basic command, applicable to any list
#[derive(Clone)]
pub enum BasicCommand<T> {
    Get {
        id: TreeId,
        index: usize,
        expected: Option<T>,
    },
    Insert {
        id: TreeId,
        index: usize,
        item: T,
        ok: bool,
    },
    InsertRange {
        id: TreeId,
        index: usize,
        items: Vec<T>,
        ok: bool,
    },
    RemoveRange {
        id: TreeId,
        start: usize,
        end: usize,
        ok: bool,
    },
    Set {
        id: TreeId,
        index: usize,
        item: T,
        // if the call shouldn't fail, the replaced item
        old: Result<T, ()>,
    },
    CheckContents {
        id: TreeId,
        items: Vec<T>,
    },
}

#[derive(Debug, Copy, Clone, Arbitrary)]
pub struct TreeId(usize);

impl Display for TreeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

const COW_VARIANTS: u8 = 4;

/// Commands that create new lists, or combine them with others
#[derive(Clone)]
pub enum CowCommand<T> {
    Basic(BasicCommand<T>),
    ShallowClone {
        src_id: TreeId,
        new_id: TreeId,
    },
    DropTree {
        id: TreeId,
    },
    Append {
        id: TreeId,
        other: TreeId,
        prepend: bool,
    },
    CopySection {
        id: TreeId,
        start: usize,
        end: usize,
        // if the call shouldn't fail, the id of the copy
        new_id: Result<TreeId, ()>,
    },
}

/// Sequence of [`BasicCommand`]s or [`CowCommand`]s
pub struct CommandSequence<C> {
    pub limits: NodeLimits,
    pub cmds: Vec<C>,
}

impl<C: Debug> Debug for CommandSequence<C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let init_id = TreeId(0);
        let (leaf, inner) = (self.limits.max_leaf(), self.limits.max_inner());
        f.write_str("#[test]\n")?;
        f.write_str("fn test_case() {\n")?;
        writeln!(
            f,
            "    let mut list_{init_id} = AList::with_limits(NodeLimits::new({leaf}, {inner}));"
        )?;
        for c in &self.cmds {
            c.fmt(f)?;
        }
        f.write_str("}")
    }
}

impl<T: Debug> Debug for BasicCommand<T> {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Get { id, index, expected: Some(item) } => {
                writeln!(f, "    assert_eq!(list_{id}.get({index}), Some(&{item:?}));")
            }
            Self::Get { id, index, expected: None } => {
                writeln!(f, "    assert_eq!(list_{id}.get({index}), None);")
            }
            Self::Insert { id, index, item, ok: true } => {
                writeln!(f, "    list_{id}.insert({index}, {item:?}).unwrap();")
            }
            Self::Insert { id, index, item, ok: false } => {
                writeln!(f, "    assert!(list_{id}.insert({index}, {item:?}).is_err());")
            }
            Self::InsertRange { id, index, items, ok: true } => {
                writeln!(f, "    list_{id}.insert_range({index}, {items:?}).unwrap();")
            }
            Self::InsertRange { id, index, items, ok: false } => {
                writeln!(f, "    assert!(list_{id}.insert_range({index}, {items:?}).is_err());")
            }
            Self::RemoveRange { id, start, end, ok: true } => {
                writeln!(f, "    list_{id}.remove_range({start}..{end}).unwrap();")
            }
            Self::RemoveRange { id, start, end, ok: false } => {
                writeln!(f, "    assert!(list_{id}.remove_range({start}..{end}).is_err());")
            }
            Self::Set { id, index, item, old: Ok(old) } => {
                writeln!(f, "    assert_eq!(list_{id}.set({index}, {item:?}), Ok({old:?}));")
            }
            Self::Set { id, index, item, old: Err(()) } => {
                writeln!(f, "    assert!(list_{id}.set({index}, {item:?}).is_err());")
            }
            Self::CheckContents { id, items } => {
                writeln!(f, "    assert_eq!(list_{id}.iter().cloned().collect::<Vec<_>>(), {items:?});")
            }
        }
    }
}

impl<T: Debug> Debug for CowCommand<T> {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Basic(c) => c.fmt(f),
            Self::ShallowClone { src_id, new_id } => {
                writeln!(f, "    let mut list_{new_id} = list_{src_id}.clone();")
            }
            Self::DropTree { id } => writeln!(f, "    drop(list_{id});"),
            Self::Append { id, other, prepend } => {
                let method = match prepend {
                    true => "prepend",
                    false => "append",
                };
                writeln!(f, "    list_{id}.{method}(&list_{other}.clone()).unwrap();")
            }
            Self::CopySection { id, start, end, new_id: Ok(new_id) } => {
                writeln!(f, "    let mut list_{new_id} = list_{id}.copy_section({start}..{end}).unwrap();")
            }
            Self::CopySection { id, start, end, new_id: Err(()) } => {
                writeln!(f, "    assert!(list_{id}.copy_section({start}..{end}).is_err());")
            }
        }
    }
}

impl<C> CommandSequence<C> {
    pub fn map<D, F: FnMut(C) -> D>(self, f: F) -> CommandSequence<D> {
        CommandSequence {
            limits: self.limits,
            cmds: self.cmds.into_iter().map(f).collect(),
        }
    }
}

impl<T> BasicCommand<T> {
    #[rustfmt::skip]
    pub fn map_item<U, F: FnMut(T) -> U>(self, mut f: F) -> BasicCommand<U> {
        match self {
            Self::Get { id, index, expected } => BasicCommand::Get {
                id,
                index,
                expected: expected.map(f),
            },
            Self::Insert { id, index, item, ok } => BasicCommand::Insert {
                id,
                index,
                item: f(item),
                ok,
            },
            Self::InsertRange { id, index, items, ok } => BasicCommand::InsertRange {
                id,
                index,
                items: items.into_iter().map(f).collect(),
                ok,
            },
            Self::RemoveRange { id, start, end, ok } => BasicCommand::RemoveRange { id, start, end, ok },
            Self::Set { id, index, item, old } => BasicCommand::Set {
                id,
                index,
                item: f(item),
                old: old.map(&mut f),
            },
            Self::CheckContents { id, items } => BasicCommand::CheckContents {
                id,
                items: items.into_iter().map(f).collect(),
            },
        }
    }
}

impl<T> CowCommand<T> {
    #[rustfmt::skip]
    pub fn map_item<U, F: FnMut(T) -> U>(self, f: F) -> CowCommand<U> {
        match self {
            Self::Basic(c) => CowCommand::Basic(c.map_item(f)),
            Self::ShallowClone { src_id, new_id } => CowCommand::ShallowClone { src_id, new_id },
            Self::DropTree { id } => CowCommand::DropTree { id },
            Self::Append { id, other, prepend } => CowCommand::Append { id, other, prepend },
            Self::CopySection { id, start, end, new_id } => {
                CowCommand::CopySection { id, start, end, new_id }
            }
        }
    }
}

impl<'d, C: ArbitraryCommand<'d>> Arbitrary<'d> for CommandSequence<C> {
    fn arbitrary(u: &mut Unstructured<'d>) -> arbitrary::Result<Self> {
        let limits: NodeLimits = u.arbitrary()?;
        let mut cmds: Vec<C> = Vec::new();

        let mut trees = vec![Some(Mock::new())];
        let mut num_trees = 1;

        while !u.is_empty() && num_trees != 0 {
            let id = TreeId(choose_sparse_index(u, num_trees, &trees)?);
            let variant = u.int_in_range(0..=C::VARIANTS - 1)?;
            cmds.push(C::arbitrary(u, variant, id, &mut num_trees, &mut trees)?);
        }

        Ok(CommandSequence { limits, cmds })
    }
}

fn choose_sparse_index<T>(
    u: &mut Unstructured,
    count: usize,
    vals: &[Option<T>],
) -> arbitrary::Result<usize> {
    let mut idx = u.choose_index(count)?;
    let mut i = 0;
    while i <= idx {
        if vals[i].is_none() {
            idx += 1;
        }
        i += 1;
    }
    Ok(idx)
}

/// Chooses a position near the bounds of a list of length `len`, occasionally just past them
fn arbitrary_index(u: &mut Unstructured, len: usize) -> arbitrary::Result<usize> {
    Ok(u.int_in_range(0..=len + 2)?)
}

pub trait ArbitraryCommand<'d>: Sized {
    const VARIANTS: u8;

    type Item;

    /// Creates a new command and executes it on the provided mock lists
    fn arbitrary(
        u: &mut Unstructured<'d>,
        variant: u8,
        id: TreeId,
        count: &mut usize,
        mocks: &mut Vec<Option<Mock<Self::Item>>>,
    ) -> arbitrary::Result<Self>;
}

impl<'d, T: Arbitrary<'d> + Clone> ArbitraryCommand<'d> for BasicCommand<T> {
    const VARIANTS: u8 = BASIC_VARIANTS;

    type Item = T;

    fn arbitrary(
        u: &mut Unstructured<'d>,
        variant: u8,
        id: TreeId,
        _count: &mut usize,
        mocks: &mut Vec<Option<Mock<T>>>,
    ) -> arbitrary::Result<Self> {
        let Some(mock) = mocks[id.0].as_mut() else {
            return Err(arbitrary::Error::IncorrectFormat);
        };
        let len = mock.len();

        match variant {
            // get
            0 => {
                let index = arbitrary_index(u, len)?;
                Ok(Self::Get {
                    id,
                    index,
                    expected: mock.get(index).cloned(),
                })
            }
            // insert
            1 => {
                let index = arbitrary_index(u, len)?;
                let item: T = u.arbitrary()?;
                let ok = index <= len;
                if ok {
                    mock.insert(index, item.clone());
                }
                Ok(Self::Insert { id, index, item, ok })
            }
            // insert_range
            2 => {
                let index = arbitrary_index(u, len)?;
                let items: Vec<T> = u.arbitrary()?;
                let ok = index <= len;
                if ok {
                    mock.insert_range(index, items.iter().cloned());
                }
                Ok(Self::InsertRange { id, index, items, ok })
            }
            // remove_range
            3 => {
                let start = arbitrary_index(u, len)?;
                let end = arbitrary_index(u, len)?;
                let ok = start <= end && end <= len;
                if ok {
                    mock.remove_range(start..end);
                }
                Ok(Self::RemoveRange { id, start, end, ok })
            }
            // set
            4 => {
                let index = arbitrary_index(u, len)?;
                let item: T = u.arbitrary()?;
                let old = match index < len {
                    true => mock.set(index, item.clone()).ok_or(()),
                    false => Err(()),
                };
                Ok(Self::Set { id, index, item, old })
            }
            // check contents
            5 => Ok(Self::CheckContents {
                id,
                items: mock.iter().cloned().collect(),
            }),
            _ => unreachable!("bad BasicCommand variant {variant}"),
        }
    }
}

impl<'d, T: Arbitrary<'d> + Clone> ArbitraryCommand<'d> for CowCommand<T> {
    const VARIANTS: u8 = BASIC_VARIANTS + COW_VARIANTS;

    type Item = T;

    fn arbitrary(
        u: &mut Unstructured<'d>,
        variant: u8,
        id: TreeId,
        count: &mut usize,
        mocks: &mut Vec<Option<Mock<T>>>,
    ) -> arbitrary::Result<Self> {
        match variant {
            v if v < BASIC_VARIANTS => {
                <BasicCommand<T> as ArbitraryCommand>::arbitrary(u, v, id, count, mocks)
                    .map(Self::Basic)
            }
            // shallow clone
            v if v == BASIC_VARIANTS => {
                let new_id = TreeId(mocks.len());
                mocks.push(mocks[id.0].clone());
                *count += 1;
                Ok(Self::ShallowClone { src_id: id, new_id })
            }
            // drop tree
            v if v == BASIC_VARIANTS + 1 => {
                mocks[id.0].take();
                *count -= 1;
                Ok(Self::DropTree { id })
            }
            // append or prepend
            v if v == BASIC_VARIANTS + 2 => {
                let other = TreeId(choose_sparse_index(u, *count, mocks)?);
                let prepend: bool = u.arbitrary()?;
                let Some(other_mock) = mocks[other.0].clone() else {
                    return Err(arbitrary::Error::IncorrectFormat);
                };
                if let Some(mock) = mocks[id.0].as_mut() {
                    match prepend {
                        true => mock.prepend(&other_mock),
                        false => mock.append(&other_mock),
                    }
                }
                Ok(Self::Append { id, other, prepend })
            }
            // copy section
            v if v == BASIC_VARIANTS + 3 => {
                let Some(mock) = mocks[id.0].as_ref() else {
                    return Err(arbitrary::Error::IncorrectFormat);
                };
                let len = mock.len();
                let start = arbitrary_index(u, len)?;
                let end = arbitrary_index(u, len)?;

                let new_id = match start <= end && end <= len {
                    false => Err(()),
                    true => {
                        let copy = mock.copy_section(start..end);
                        mocks.push(Some(copy));
                        *count += 1;
                        Ok(TreeId(mocks.len() - 1))
                    }
                };
                Ok(Self::CopySection { id, start, end, new_id })
            }
            _ => unreachable!("bad CowCommand variant {variant}"),
        }
    }
}

/// Ongoing state for executing commands to an [`AList`] and mock implementation
pub struct RunnerState<T> {
    lists: Vec<Option<AList<T>>>,
}

impl<T: Debug + Clone + PartialEq> RunnerState<T> {
    /// Creates a new, blank `RunnerState` to run a series of commands
    pub fn init(limits: NodeLimits) -> Self {
        RunnerState {
            lists: vec![Some(AList::with_limits(limits))],
        }
    }

    fn list(&mut self, id: TreeId) -> &mut AList<T> {
        self.lists[id.0].as_mut().unwrap()
    }

    /// Runs the command
    #[rustfmt::skip]
    pub fn run_basic_cmd(&mut self, cmd: &BasicCommand<T>) {
        match cmd {
            BasicCommand::Get { id, index, expected } => {
                assert_eq!(self.list(*id).get(*index), expected.as_ref());
            }
            BasicCommand::Insert { id, index, item, ok } => {
                let list = self.list(*id);
                assert_eq!(list.insert(*index, item.clone()).is_ok(), *ok);
                list.as_tree().validate();
            }
            BasicCommand::InsertRange { id, index, items, ok } => {
                let list = self.list(*id);
                assert_eq!(list.insert_range(*index, items.iter().cloned()).is_ok(), *ok);
                list.as_tree().validate();
            }
            BasicCommand::RemoveRange { id, start, end, ok } => {
                let list = self.list(*id);
                assert_eq!(list.remove_range(*start..*end).is_ok(), *ok);
                list.as_tree().validate();
            }
            BasicCommand::Set { id, index, item, old } => {
                let list = self.list(*id);
                assert_eq!(list.set(*index, item.clone()).map_err(|_| ()), *old);
                list.as_tree().validate();
            }
            BasicCommand::CheckContents { id, items } => {
                let list = self.list(*id);
                assert!(list.iter().eq(items.iter()));
            }
        }
    }

    pub fn run_cow_cmd(&mut self, cmd: &CowCommand<T>) {
        match cmd {
            CowCommand::Basic(c) => self.run_basic_cmd(c),
            CowCommand::ShallowClone { src_id, .. } => {
                let new_list = self.list(*src_id).clone();
                new_list.as_tree().validate();
                self.lists.push(Some(new_list));
            }
            CowCommand::DropTree { id } => drop(self.lists[id.0].take()),
            CowCommand::Append { id, other, prepend } => {
                let other = self.list(*other).clone();
                let list = self.list(*id);
                match prepend {
                    true => list.prepend(&other).unwrap(),
                    false => list.append(&other).unwrap(),
                }
                list.as_tree().validate();
                other.as_tree().validate();
            }
            CowCommand::CopySection { id, start, end, new_id } => {
                let list = self.list(*id);
                match new_id {
                    Ok(_) => {
                        let copy = list.copy_section(*start..*end).unwrap();
                        copy.as_tree().validate();
                        list.as_tree().validate();
                        self.lists.push(Some(copy));
                    }
                    Err(()) => assert!(list.copy_section(*start..*end).is_err()),
                }
            }
        }
    }
}
