//! Algorithm to cluster a binary image

use crate::{BinaryImage, BoundingRect, PathI32, PointI32, Result};

/// A cluster of binary image pixels
#[derive(Debug, Default)]
pub struct Cluster {
    /// Points are in the coordinate of the image the cluster was found in.
    pub points: Vec<PointI32>,
    pub rect: BoundingRect,
}

/// A collection of clusters
#[derive(Debug, Default)]
pub struct Clusters {
    pub clusters: Vec<Cluster>,
    pub rect: BoundingRect,
}

impl Cluster {
    pub fn add(&mut self, pos: PointI32) {
        self.points.push(pos);
        self.rect.add_x_y(pos.x, pos.y);
    }

    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn to_binary_image(&self) -> BinaryImage {
        let mut image =
            BinaryImage::new_w_h(self.rect.width() as usize, self.rect.height() as usize);
        for p in self.points.iter() {
            image.set_pixel(
                p.x as usize - self.rect.left as usize,
                p.y as usize - self.rect.top as usize,
                true,
            );
        }
        image
    }

    /// Outer ring first (clockwise), then one ring per enclosed hole (anti-clockwise),
    /// in the same coordinates as `points`.
    pub fn to_paths(&self) -> Result<Vec<PathI32>> {
        let origin = self.rect.left_top();
        let mut paths = Self::image_to_paths(&self.to_binary_image())?;
        for path in paths.iter_mut() {
            path.offset(&origin);
        }
        Ok(paths)
    }

    pub fn image_to_paths(image: &BinaryImage) -> Result<Vec<PathI32>> {
        let mut boundaries = vec![(image.clone(), PointI32 { x: 0, y: 0 })];
        let holes = image.negative().to_clusters(false);
        for hole in holes.iter() {
            if  hole.rect.left as usize == 0 ||
                hole.rect.top as usize == 0 ||
                hole.rect.right as usize == image.width ||
                hole.rect.bottom as usize == image.height {
                continue;
            }
            for p in hole.points.iter() {
                boundaries[0].0.set_pixel(p.x as usize, p.y as usize, true);
            }
            boundaries.push((hole.to_binary_image(), hole.rect.left_top()));
        }
        let mut paths = vec![];
        for (i, (image, offset)) in boundaries.iter().enumerate() {
            let mut path = PathI32::image_to_path(image, i == 0)?;
            path.offset(offset);
            if !path.is_empty() {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl Clusters {
    pub fn iter(&self) -> std::slice::Iter<Cluster> {
        self.clusters.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl IntoIterator for Clusters {
    type IntoIter = std::vec::IntoIter<Cluster>;
    type Item = Cluster;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.into_iter()
    }
}

impl BinaryImage {
    /// Groups set pixels into connected clusters, 4-connected unless `diagonal`.
    /// Clusters come out in order of their first pixel in raster order.
    pub fn to_clusters(&self, diagonal: bool) -> Clusters {
        let mut clusters = Vec::<Cluster>::new();
        let mut rect = BoundingRect::default();
        let mut clustermap = vec![0usize; self.width * self.height];
        let width = self.width;
        let at = |x: usize, y: usize| y * width + x;
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = PointI32 { x: x as i32, y: y as i32 };
                let v = self.get_pixel(x, y);
                let v_up = self.get_pixel_safe(pos.x, pos.y - 1);
                let v_left = self.get_pixel_safe(pos.x - 1, pos.y);
                let v_up_left = self.get_pixel_safe(pos.x - 1, pos.y - 1);
                let mut cluster_up = if y > 0 { clustermap[at(x, y - 1)] } else { 0 };
                let mut cluster_left = if x > 0 { clustermap[at(x - 1, y)] } else { 0 };
                if (v || diagonal) && v_up && v_left && cluster_left != cluster_up {
                    if clusters[cluster_left].size() <= clusters[cluster_up].size() {
                        combine_cluster(&mut clusters, &mut clustermap, width, cluster_left, cluster_up);
                        cluster_left = cluster_up;
                    } else {
                        combine_cluster(&mut clusters, &mut clustermap, width, cluster_up, cluster_left);
                        cluster_up = cluster_left;
                    }
                }
                if v {
                    rect.add_x_y(pos.x, pos.y);
                    let index = if v_up {
                        cluster_up
                    } else if v_left {
                        cluster_left
                    } else if v_up_left && diagonal {
                        clustermap[at(x - 1, y - 1)]
                    } else {
                        clusters.push(Cluster::default());
                        clusters.len() - 1
                    };
                    clustermap[at(x, y)] = index;
                    clusters[index].add(pos);
                }
            }
        }

        fn combine_cluster(
            clusters: &mut [Cluster],
            clustermap: &mut [usize],
            width: usize,
            from: usize,
            to: usize,
        ) {
            for o in clusters[from].points.iter() {
                clustermap[o.y as usize * width + o.x as usize] = to;
            }
            let mut drain = std::mem::take(&mut clusters[from].points);
            clusters[to].points.append(&mut drain);
            let rect = clusters[from].rect;
            clusters[to].rect.merge(rect);
        }

        let mut clusters: Vec<Cluster> = clusters.into_iter().filter(|c| c.size() != 0).collect();
        for cluster in clusters.iter_mut() {
            cluster.points.sort_by_key(|p| (p.y, p.x));
        }
        clusters.sort_by_key(|c| (c.points[0].y, c.points[0].x));

        Clusters { clusters, rect }
    }
}
