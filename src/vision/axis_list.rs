use crate::comp::base::EntityId;

/// 節點類型
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    /// 視野下界
    Min = 0,
    /// 視野上界
    Max = 1,
    /// 實體位置
    Pos = 2,
}

/// 相鄰節點交換事件
///
/// `mover` 是主動移動的節點，`passed` 是被越過的節點。
/// 是否構成視野變化由上層依節點類型組合判定。
#[derive(Copy, Clone, Debug)]
pub struct Crossing {
    pub mover_kind: MarkerKind,
    pub mover_owner: EntityId,
    pub passed_kind: MarkerKind,
    pub passed_owner: EntityId,
    pub moving_right: bool,
}

#[derive(Clone, Debug)]
struct Marker {
    kind: MarkerKind,
    owner: EntityId,
    val: f64,
    prev: usize,
    next: usize,
}

const HEAD: usize = 0;
const TAIL: usize = 1;

/// 單軸排序鏈表
///
/// 節點存放在 arena 中以索引互連，頭尾哨兵為 ±∞ 且永不移動。
/// 值變更時以氣泡方式與相鄰節點交換回到定位，每次交換回報一個
/// `Crossing`。相等的值視為已排序，不會交換。
#[derive(Clone, Debug)]
pub struct AxisList {
    nodes: Vec<Marker>,
    free: Vec<usize>,
}

impl AxisList {
    pub fn new() -> Self {
        let head = Marker {
            kind: MarkerKind::Pos,
            owner: EntityId(i64::MIN),
            val: f64::NEG_INFINITY,
            prev: HEAD,
            next: TAIL,
        };
        let tail = Marker {
            kind: MarkerKind::Pos,
            owner: EntityId(i64::MIN),
            val: f64::INFINITY,
            prev: HEAD,
            next: TAIL,
        };
        AxisList {
            nodes: vec![head, tail],
            free: vec![],
        }
    }

    /// 掛載一個新節點到尾哨兵之前，初始值為 +∞
    ///
    /// 與尾哨兵等值所以不會被動移動；之後第一次 `update` 會把它
    /// 往左氣泡到定位，沿途產生初始交叉事件。
    pub fn insert_before_tail(&mut self, kind: MarkerKind, owner: EntityId) -> usize {
        let prev = self.nodes[TAIL].prev;
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Marker {
                    kind,
                    owner,
                    val: f64::INFINITY,
                    prev,
                    next: TAIL,
                };
                idx
            }
            None => {
                self.nodes.push(Marker {
                    kind,
                    owner,
                    val: f64::INFINITY,
                    prev,
                    next: TAIL,
                });
                self.nodes.len() - 1
            }
        };
        self.nodes[prev].next = idx;
        self.nodes[TAIL].prev = idx;
        idx
    }

    /// 解除鏈接並回收節點；不做任何排序或事件回報
    pub fn remove(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.free.push(idx);
    }

    pub fn value(&self, idx: usize) -> f64 {
        self.nodes[idx].val
    }

    /// 更新節點值並氣泡回定位，對每次相鄰交換呼叫 `on_cross`
    ///
    /// 單次呼叫的前提是鏈表目前已排序；之後仍然排序。
    pub fn update<F: FnMut(&Crossing)>(&mut self, idx: usize, new_val: f64, mut on_cross: F) {
        self.nodes[idx].val = new_val;

        // 向右移動（值變大）
        loop {
            let next = self.nodes[idx].next;
            if next == TAIL || self.nodes[idx].val <= self.nodes[next].val {
                break;
            }
            self.swap(idx, next);
            on_cross(&Crossing {
                mover_kind: self.nodes[idx].kind,
                mover_owner: self.nodes[idx].owner,
                passed_kind: self.nodes[next].kind,
                passed_owner: self.nodes[next].owner,
                moving_right: true,
            });
        }
        // 向左移動（值變小）
        loop {
            let prev = self.nodes[idx].prev;
            if prev == HEAD || self.nodes[idx].val >= self.nodes[prev].val {
                break;
            }
            self.swap(prev, idx);
            on_cross(&Crossing {
                mover_kind: self.nodes[idx].kind,
                mover_owner: self.nodes[idx].owner,
                passed_kind: self.nodes[prev].kind,
                passed_owner: self.nodes[prev].owner,
                moving_right: false,
            });
        }
    }

    /// 交換相鄰節點: left -> right ==> right -> left
    fn swap(&mut self, left: usize, right: usize) {
        let l_prev = self.nodes[left].prev;
        let r_next = self.nodes[right].next;
        self.nodes[l_prev].next = right;
        self.nodes[right].prev = l_prev;
        self.nodes[right].next = left;
        self.nodes[left].prev = right;
        self.nodes[left].next = r_next;
        self.nodes[r_next].prev = left;
    }

    /// 哨兵之間的節點值是否不遞減
    pub fn is_sorted(&self) -> bool {
        let mut idx = self.nodes[HEAD].next;
        let mut last = f64::NEG_INFINITY;
        while idx != TAIL {
            if self.nodes[idx].val < last {
                return false;
            }
            last = self.nodes[idx].val;
            idx = self.nodes[idx].next;
        }
        true
    }

    /// 由左至右的節點值（不含哨兵）
    pub fn values(&self) -> Vec<f64> {
        let mut out = vec![];
        let mut idx = self.nodes[HEAD].next;
        while idx != TAIL {
            out.push(self.nodes[idx].val);
            idx = self.nodes[idx].next;
        }
        out
    }

    /// 哨兵之間的節點數
    pub fn len(&self) -> usize {
        self.nodes.len() - 2 - self.free.len()
    }
}

impl Default for AxisList {
    fn default() -> Self {
        Self::new()
    }
}
